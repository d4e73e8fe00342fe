/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! cryptographic key pairs and the aggregated token signature
//!
//! Every block of a token is signed by its own key pair, and the per block
//! signatures aggregate into a single `(parameters, z)` pair that the
//! verifier checks against the ordered list of public keys and the exact
//! on-wire bytes of each block. Adding a block only requires the previous
//! aggregate, never the previous private keys, which is what allows
//! offline attenuation by third parties.
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use std::convert::TryInto;
use zeroize::Zeroize;

use crate::error;

/// a private and public key pair for one block
pub struct KeyPair {
    private: Scalar,
    public: RistrettoPoint,
}

impl KeyPair {
    pub fn new<T: RngCore + CryptoRng>(rng: &mut T) -> Self {
        let private = Scalar::random(rng);
        let public = private * RISTRETTO_BASEPOINT_POINT;

        KeyPair { private, public }
    }

    pub fn from(key: PrivateKey) -> Self {
        KeyPair {
            private: key.0,
            public: key.0 * RISTRETTO_BASEPOINT_POINT,
        }
    }

    pub fn private(&self) -> PrivateKey {
        PrivateKey(self.private)
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.public)
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private.zeroize();
    }
}

/// the private part of a [KeyPair]
#[derive(Clone)]
pub struct PrivateKey(pub(crate) Scalar);

impl PrivateKey {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, error::Format> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| error::Format::InvalidKeySize(bytes.len()))?;

        Option::from(Scalar::from_canonical_bytes(bytes))
            .map(PrivateKey)
            .ok_or(error::Format::InvalidKey)
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// the public part of a [KeyPair]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub(crate) RistrettoPoint);

impl PublicKey {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, error::Format> {
        if bytes.len() != 32 {
            return Err(error::Format::InvalidKeySize(bytes.len()));
        }

        CompressedRistretto::from_slice(bytes)
            .ok()
            .and_then(|compressed| compressed.decompress())
            .map(PublicKey)
            .ok_or(error::Format::InvalidKey)
    }
}

/// aggregated signature over the ordered list of serialized blocks
///
/// each signer contributes a commitment `A_i = r_i * G` stored in
/// `parameters`, and folds `r_i * d_i - e_i * x_i` into `z`, with
/// `d_i = H(A_i)` and `e_i = H(X_i | message_i)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSignature {
    pub parameters: Vec<RistrettoPoint>,
    pub z: Scalar,
}

impl TokenSignature {
    /// signs the first message, starting a new aggregate
    pub fn new<T: RngCore + CryptoRng>(rng: &mut T, keypair: &KeyPair, message: &[u8]) -> Self {
        let signature = TokenSignature {
            parameters: Vec::new(),
            z: Scalar::ZERO,
        };

        signature.sign(rng, keypair, message)
    }

    /// appends a new signer's contribution to the aggregate
    pub fn sign<T: RngCore + CryptoRng>(
        &self,
        rng: &mut T,
        keypair: &KeyPair,
        message: &[u8],
    ) -> Self {
        let r = Scalar::random(rng);
        let commitment = r * RISTRETTO_BASEPOINT_POINT;
        let d = hash_point(&commitment);
        let e = hash_message(&keypair.public, message);

        let mut parameters = self.parameters.clone();
        parameters.push(commitment);

        TokenSignature {
            parameters,
            z: self.z + r * d - e * keypair.private,
        }
    }

    /// checks the aggregate against one public key and one message per block
    ///
    /// `messages[i]` must be the exact bytes that were signed, the caller
    /// never re-serializes blocks before verifying
    pub fn verify(
        &self,
        public_keys: &[PublicKey],
        messages: &[&[u8]],
    ) -> Result<(), error::Signature> {
        if public_keys.len() != messages.len() || public_keys.len() != self.parameters.len() {
            return Err(error::Signature::InvalidFormat);
        }

        let zp = self.z * RISTRETTO_BASEPOINT_POINT;

        let mut eixi = RistrettoPoint::identity();
        for (key, message) in public_keys.iter().zip(messages) {
            eixi += hash_message(&key.0, message) * key.0;
        }

        let mut diai = RistrettoPoint::identity();
        for commitment in self.parameters.iter() {
            diai += hash_point(commitment) * commitment;
        }

        if zp + eixi == diai {
            Ok(())
        } else {
            Err(error::Signature::InvalidSignature)
        }
    }

    pub(crate) fn parameters_bytes(&self) -> Vec<Vec<u8>> {
        self.parameters
            .iter()
            .map(|p| p.compress().to_bytes().to_vec())
            .collect()
    }

    pub(crate) fn z_bytes(&self) -> Vec<u8> {
        self.z.to_bytes().to_vec()
    }

    pub(crate) fn from_bytes(parameters: &[Vec<u8>], z: &[u8]) -> Result<Self, error::Format> {
        let mut points = Vec::with_capacity(parameters.len());
        for bytes in parameters {
            if bytes.len() != 32 {
                return Err(error::Format::InvalidKeySize(bytes.len()));
            }
            let point = CompressedRistretto::from_slice(bytes)
                .ok()
                .and_then(|compressed| compressed.decompress())
                .ok_or(error::Format::InvalidKey)?;
            points.push(point);
        }

        let z_bytes: [u8; 32] = z
            .try_into()
            .map_err(|_| error::Format::InvalidKeySize(z.len()))?;
        let z = Option::from(Scalar::from_canonical_bytes(z_bytes))
            .ok_or(error::Format::InvalidKey)?;

        Ok(TokenSignature {
            parameters: points,
            z,
        })
    }
}

fn hash_point(point: &RistrettoPoint) -> Scalar {
    Scalar::from_hash(Sha512::new().chain_update(point.compress().as_bytes()))
}

fn hash_message(public: &RistrettoPoint, message: &[u8]) -> Scalar {
    Scalar::from_hash(
        Sha512::new()
            .chain_update(public.compress().as_bytes())
            .chain_update(message),
    )
}
