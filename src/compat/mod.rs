use elliptic_curve::{point::AffineCoordinates, CurveArithmetic, Group, PrimeCurve};
use subtle::Choice;

#[cfg(any(feature = "k256", test))]
mod k256_impl;

/// The length of a serialized scalar, or of an x-only point.
pub const SCALAR_LEN: usize = 32;
/// The length of a SEC1 compressed point.
pub const POINT_LEN: usize = 33;

/// Represents a curve backend suitable for use in MuSig2.
///
/// This is the seam between the protocol logic in this crate and whichever
/// library actually performs constant-time curve arithmetic. The protocol
/// code only ever uses the RustCrypto group and field traits plus the few
/// byte conversions below, so a backend never needs to know anything about
/// MuSig2 itself.
///
/// MuSig2 is only defined over secp256k1, so the encodings are fixed to
/// its sizes. This library provides an implementation for [`k256::Secp256k1`]
/// behind the `k256` feature.
pub trait MuSigCurve: PrimeCurve + CurveArithmetic {
    /// Parse a big-endian scalar, rejecting values not below the group order.
    fn scalar_from_bytes(bytes: &[u8; SCALAR_LEN]) -> Option<Self::Scalar>;

    /// Interpret big-endian bytes as an integer, reduced modulo the group order.
    fn scalar_reduce(bytes: &[u8; SCALAR_LEN]) -> Self::Scalar;

    /// Serialize a scalar as big-endian bytes.
    fn scalar_to_bytes(scalar: &Self::Scalar) -> [u8; SCALAR_LEN];

    /// Parse a SEC1 compressed point.
    ///
    /// This must reject anything which isn't on the curve, along with the identity.
    fn point_from_bytes(bytes: &[u8; POINT_LEN]) -> Option<Self::AffinePoint>;

    /// Serialize a point in SEC1 compressed form, or `None` for the identity.
    fn point_to_bytes(point: &Self::AffinePoint) -> Option<[u8; POINT_LEN]>;

    /// The x coordinate of a point, as bytes.
    fn x_only_bytes(point: &Self::AffinePoint) -> [u8; SCALAR_LEN];
}

/// Whether or not a point has an odd y coordinate.
pub(crate) fn y_is_odd<C: MuSigCurve>(point: &C::AffinePoint) -> Choice {
    point.y_is_odd()
}

/// Recover the point with even y coordinate for a given x coordinate.
pub(crate) fn lift_x<C: MuSigCurve>(x: &[u8; SCALAR_LEN]) -> Option<C::AffinePoint> {
    let mut bytes = [0u8; POINT_LEN];
    bytes[0] = 0x02;
    bytes[1..].copy_from_slice(x);
    C::point_from_bytes(&bytes)
}

/// Parse a point which is allowed to be the identity, encoded as all zeros.
pub(crate) fn point_from_bytes_ext<C: MuSigCurve>(
    bytes: &[u8; POINT_LEN],
) -> Option<C::ProjectivePoint> {
    if bytes.iter().all(|&b| b == 0) {
        return Some(C::ProjectivePoint::identity());
    }
    C::point_from_bytes(bytes).map(C::ProjectivePoint::from)
}

/// Serialize a point, encoding the identity as all zeros.
pub(crate) fn point_to_bytes_ext<C: MuSigCurve>(point: &C::AffinePoint) -> [u8; POINT_LEN] {
    C::point_to_bytes(point).unwrap_or([0u8; POINT_LEN])
}
