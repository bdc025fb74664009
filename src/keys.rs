//! Key types for signers and for the aggregate key.
use std::cmp::Ordering;
use std::fmt;

use elliptic_curve::{group::Curve as _, Field, Group};
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::compat::{self, MuSigCurve, POINT_LEN, SCALAR_LEN};
use crate::errors::{CryptoFailure, MuSigError, Result};

/// The parity of the y coordinate of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub(crate) fn of<C: MuSigCurve>(point: &C::AffinePoint) -> Self {
        if bool::from(compat::y_is_odd::<C>(point)) {
            Parity::Odd
        } else {
            Parity::Even
        }
    }

    pub fn is_odd(self) -> bool {
        self == Parity::Odd
    }
}

/// A secret signing key, i.e. a nonzero scalar.
///
/// The scalar is wiped from memory when the key is dropped.
#[derive(Clone)]
pub struct SecretKey<C: MuSigCurve> {
    scalar: C::Scalar,
}

impl<C: MuSigCurve> SecretKey<C> {
    /// Generate a new random secret key.
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        loop {
            let scalar = C::Scalar::random(&mut *rng);
            if !bool::from(scalar.is_zero()) {
                return Self { scalar };
            }
        }
    }

    /// Parse a secret key from 32 big-endian bytes.
    ///
    /// This fails if the scalar is zero, or not below the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MuSigError::check_key_size(bytes, SCALAR_LEN)?;
        let mut array = [0u8; SCALAR_LEN];
        array.copy_from_slice(bytes);
        let parsed = C::scalar_from_bytes(&array);
        array.zeroize();
        let scalar = parsed.ok_or(CryptoFailure::ScalarOutOfRange)?;
        if bool::from(scalar.is_zero()) {
            return Err(CryptoFailure::ZeroScalar.into());
        }
        Ok(Self { scalar })
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_LEN] {
        C::scalar_to_bytes(&self.scalar)
    }

    /// The public key matching this secret key.
    pub fn public_key(&self) -> PublicKey<C> {
        let point = (C::ProjectivePoint::generator() * self.scalar).to_affine();
        PublicKey {
            point,
            bytes: compat::point_to_bytes_ext::<C>(&point),
        }
    }

    pub(crate) fn scalar(&self) -> &C::Scalar {
        &self.scalar
    }
}

impl<C: MuSigCurve> fmt::Debug for SecretKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl<C: MuSigCurve> Drop for SecretKey<C> {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl<C: MuSigCurve> ZeroizeOnDrop for SecretKey<C> {}

/// A public key, i.e. a point on the curve other than the identity.
///
/// Keys are ordered by their compressed encoding, which is how they get
/// sorted before aggregation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey<C: MuSigCurve> {
    point: C::AffinePoint,
    bytes: [u8; POINT_LEN],
}

impl<C: MuSigCurve> PublicKey<C> {
    /// Parse a key from its 33 byte compressed encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MuSigError::check_size(bytes, POINT_LEN)?;
        let mut array = [0u8; POINT_LEN];
        array.copy_from_slice(bytes);
        let point = C::point_from_bytes(&array).ok_or(CryptoFailure::InvalidPoint)?;
        Ok(Self {
            point,
            bytes: array,
        })
    }

    /// Create a key from a point, failing if that point is the identity.
    pub fn from_affine(point: C::AffinePoint) -> Result<Self> {
        let bytes = C::point_to_bytes(&point).ok_or(CryptoFailure::PointAtInfinity)?;
        Ok(Self { point, bytes })
    }

    pub(crate) fn from_projective(point: C::ProjectivePoint) -> Result<Self> {
        Self::from_affine(point.to_affine())
    }

    pub fn to_bytes(&self) -> [u8; POINT_LEN] {
        self.bytes
    }

    pub fn as_affine(&self) -> &C::AffinePoint {
        &self.point
    }

    pub(crate) fn to_projective(self) -> C::ProjectivePoint {
        self.point.into()
    }

    pub fn parity(&self) -> Parity {
        Parity::of::<C>(&self.point)
    }

    /// Drop the parity of this key, returning it alongside the x-only key.
    pub fn x_only(&self) -> (XOnlyPublicKey<C>, Parity) {
        let mut bytes = [0u8; SCALAR_LEN];
        bytes.copy_from_slice(&self.bytes[1..]);
        let parity = self.parity();
        let point = if parity.is_odd() {
            (-self.to_projective()).to_affine()
        } else {
            self.point
        };
        (XOnlyPublicKey { point, bytes }, parity)
    }
}

impl<C: MuSigCurve> fmt::Debug for PublicKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.bytes))
    }
}

impl<C: MuSigCurve> PartialOrd for PublicKey<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: MuSigCurve> Ord for PublicKey<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

/// A public key known only by its x coordinate, implicitly with an even y coordinate.
///
/// This is the form BIP-340 signatures are verified against.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct XOnlyPublicKey<C: MuSigCurve> {
    point: C::AffinePoint,
    bytes: [u8; SCALAR_LEN],
}

impl<C: MuSigCurve> XOnlyPublicKey<C> {
    /// Parse an x-only key from 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MuSigError::check_size(bytes, SCALAR_LEN)?;
        let mut array = [0u8; SCALAR_LEN];
        array.copy_from_slice(bytes);
        let point = compat::lift_x::<C>(&array).ok_or(CryptoFailure::InvalidPoint)?;
        Ok(Self {
            point,
            bytes: array,
        })
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_LEN] {
        self.bytes
    }

    /// The point with even y coordinate this key stands for.
    pub fn as_affine(&self) -> &C::AffinePoint {
        &self.point
    }

    /// Restore a full public key, given the parity that was dropped.
    pub fn to_public_key(&self, parity: Parity) -> PublicKey<C> {
        let point = if parity.is_odd() {
            -C::ProjectivePoint::from(self.point)
        } else {
            C::ProjectivePoint::from(self.point)
        };
        let mut bytes = [0u8; POINT_LEN];
        bytes[0] = if parity.is_odd() { 0x03 } else { 0x02 };
        bytes[1..].copy_from_slice(&self.bytes);
        PublicKey {
            point: point.to_affine(),
            bytes,
        }
    }
}

impl<C: MuSigCurve> fmt::Debug for XOnlyPublicKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XOnlyPublicKey({})", hex::encode(self.bytes))
    }
}
