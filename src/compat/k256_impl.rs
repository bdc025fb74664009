use super::{MuSigCurve, POINT_LEN, SCALAR_LEN};

use elliptic_curve::{
    ff::PrimeField,
    ops::Reduce,
    point::AffineCoordinates,
    sec1::{FromEncodedPoint, ToEncodedPoint},
    Curve,
};
use k256::{AffinePoint, EncodedPoint, FieldBytes, Scalar, Secp256k1};

impl MuSigCurve for Secp256k1 {
    fn scalar_from_bytes(bytes: &[u8; SCALAR_LEN]) -> Option<Scalar> {
        Option::from(Scalar::from_repr(FieldBytes::clone_from_slice(bytes)))
    }

    fn scalar_reduce(bytes: &[u8; SCALAR_LEN]) -> Scalar {
        <Scalar as Reduce<<Secp256k1 as Curve>::Uint>>::reduce_bytes(
            &FieldBytes::clone_from_slice(bytes),
        )
    }

    fn scalar_to_bytes(scalar: &Scalar) -> [u8; SCALAR_LEN] {
        let mut out = [0u8; SCALAR_LEN];
        out.copy_from_slice(&scalar.to_bytes());
        out
    }

    fn point_from_bytes(bytes: &[u8; POINT_LEN]) -> Option<AffinePoint> {
        let encoded = EncodedPoint::from_bytes(bytes).ok()?;
        if !encoded.is_compressed() {
            return None;
        }
        Option::from(AffinePoint::from_encoded_point(&encoded))
    }

    fn point_to_bytes(point: &AffinePoint) -> Option<[u8; POINT_LEN]> {
        let encoded = point.to_encoded_point(true);
        let bytes = encoded.as_bytes();
        // The identity encodes as a single byte.
        if bytes.len() != POINT_LEN {
            return None;
        }
        let mut out = [0u8; POINT_LEN];
        out.copy_from_slice(bytes);
        Some(out)
    }

    fn x_only_bytes(point: &AffinePoint) -> [u8; SCALAR_LEN] {
        let mut out = [0u8; SCALAR_LEN];
        out.copy_from_slice(&point.x());
        out
    }
}
