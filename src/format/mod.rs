/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! token serialization/deserialization
//!
//! The on-wire container stores the serialized bytes of every block
//! next to one public key per block and the aggregated signature. The
//! bytes are kept as stored: appending a block signs and reuses the
//! exact prior bytes, so signatures stay stable across round-trips.
use prost::Message;
use rand_core::{CryptoRng, RngCore};

use crate::crypto::{KeyPair, PublicKey, TokenSignature};
use crate::error;
use crate::token::Block;

pub mod convert;
pub mod schema;

use convert::*;

/// on-wire representation of a token
#[derive(Clone, Debug)]
pub struct SerializedBiscuit {
    /// serialized authority block
    pub authority: Vec<u8>,
    /// serialized attenuation blocks
    pub blocks: Vec<Vec<u8>>,
    /// one public key per block, authority first
    pub keys: Vec<PublicKey>,
    /// aggregated signature over the block bytes
    pub signature: TokenSignature,
}

impl SerializedBiscuit {
    /// deserializes the container without checking the signature
    ///
    /// the caller is expected to validate block indexes, the key count
    /// and the signature before using the content
    pub fn from_slice(slice: &[u8]) -> Result<Self, error::Format> {
        let data = schema::Biscuit::decode(slice).map_err(|e| {
            error::Format::DeserializationError(format!("deserialization error: {:?}", e))
        })?;

        let mut keys = Vec::with_capacity(data.keys.len());
        for key in data.keys.iter() {
            keys.push(PublicKey::from_bytes(key)?);
        }

        let signature = TokenSignature::from_bytes(&data.signature.parameters, &data.signature.z)?;

        Ok(SerializedBiscuit {
            authority: data.authority,
            blocks: data.blocks,
            keys,
            signature,
        })
    }

    pub fn to_proto(&self) -> schema::Biscuit {
        schema::Biscuit {
            authority: self.authority.clone(),
            blocks: self.blocks.clone(),
            keys: self.keys.iter().map(|k| k.to_bytes().to_vec()).collect(),
            signature: schema::Signature {
                parameters: self.signature.parameters_bytes(),
                z: self.signature.z_bytes(),
            },
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, error::Format> {
        let proto = self.to_proto();
        let mut v = Vec::with_capacity(proto.encoded_len());
        proto
            .encode(&mut v)
            .map(|_| v)
            .map_err(|e| error::Format::SerializationError(format!("serialization error: {:?}", e)))
    }

    pub fn serialized_size(&self) -> usize {
        self.to_proto().encoded_len()
    }

    /// creates a new token container from the authority block
    pub fn new<T: RngCore + CryptoRng>(
        rng: &mut T,
        keypair: &KeyPair,
        authority: &Block,
    ) -> Result<Self, error::Format> {
        let bytes = serialize_block(authority)?;
        let signature = TokenSignature::new(rng, keypair, &bytes);

        Ok(SerializedBiscuit {
            authority: bytes,
            blocks: vec![],
            keys: vec![keypair.public()],
            signature,
        })
    }

    /// adds a new block, serializing it and extending the aggregate
    /// signature under the new key pair
    pub fn append<T: RngCore + CryptoRng>(
        &self,
        rng: &mut T,
        keypair: &KeyPair,
        block: &Block,
    ) -> Result<Self, error::Format> {
        let bytes = serialize_block(block)?;
        let signature = self.signature.sign(rng, keypair, &bytes);

        let mut blocks = self.blocks.clone();
        blocks.push(bytes);

        let mut keys = self.keys.clone();
        keys.push(keypair.public());

        Ok(SerializedBiscuit {
            authority: self.authority.clone(),
            blocks,
            keys,
            signature,
        })
    }

    /// the container must carry one public key per block
    pub fn check_key_count(&self) -> Result<(), error::Format> {
        if self.keys.len() == 1 + self.blocks.len() {
            Ok(())
        } else {
            Err(error::Format::InvalidKeyCount)
        }
    }

    /// checks the aggregated signature over the stored block bytes
    pub fn verify(&self) -> Result<(), error::Format> {
        let mut messages: Vec<&[u8]> = Vec::with_capacity(1 + self.blocks.len());
        messages.push(&self.authority);
        for block in self.blocks.iter() {
            messages.push(block);
        }

        self.signature
            .verify(&self.keys, &messages)
            .map_err(error::Format::Signature)
    }

    /// the first key must be the root public key the verifier trusts
    pub fn check_root_key(&self, root: PublicKey) -> Result<(), error::Format> {
        match self.keys.first() {
            Some(key) if *key == root => Ok(()),
            _ => Err(error::Format::UnknownPublicKey),
        }
    }
}

pub(crate) fn serialize_block(block: &Block) -> Result<Vec<u8>, error::Format> {
    let proto = token_block_to_proto_block(block);
    let mut v = Vec::with_capacity(proto.encoded_len());
    proto.encode(&mut v).map(|_| v).map_err(|e| {
        error::Format::BlockSerializationError(format!("serialization error: {:?}", e))
    })
}

pub(crate) fn deserialize_block(bytes: &[u8]) -> Result<Block, error::Format> {
    let proto = schema::Block::decode(bytes).map_err(|e| {
        error::Format::BlockDeserializationError(format!("deserialization error: {:?}", e))
    })?;

    proto_block_to_token_block(&proto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::{fact, SymbolTable, Term};
    use rand::prelude::StdRng;
    use rand_core::SeedableRng;

    fn sample_block(index: u32) -> Block {
        let mut symbols = SymbolTable::new();
        let right = symbols.insert("right");
        let file1 = symbols.add("file1");
        let read = symbols.add("read");

        Block {
            index,
            symbols,
            facts: vec![fact(right, &[&file1, &read, &Term::Integer(42)])],
            rules: vec![],
            caveats: vec![],
            context: Some("test".to_string()),
        }
    }

    #[test]
    fn block_round_trip() {
        let block = sample_block(0);
        let bytes = serialize_block(&block).unwrap();
        let parsed = deserialize_block(&bytes).unwrap();

        assert_eq!(parsed.index, block.index);
        assert_eq!(parsed.symbols, block.symbols);
        assert_eq!(parsed.facts, block.facts);
        assert_eq!(parsed.context, block.context);

        // re-serialization is byte stable
        assert_eq!(serialize_block(&parsed).unwrap(), bytes);
    }

    #[test]
    fn container_round_trip() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(42);
        let root = KeyPair::new(&mut rng);

        let container = SerializedBiscuit::new(&mut rng, &root, &sample_block(0)).unwrap();
        container.check_key_count().unwrap();
        container.verify().unwrap();

        let keypair = KeyPair::new(&mut rng);
        let appended = container
            .append(&mut rng, &keypair, &sample_block(1))
            .unwrap();
        appended.verify().unwrap();

        // prior block bytes are reused bit for bit
        assert_eq!(appended.authority, container.authority);

        let bytes = appended.to_vec().unwrap();
        let parsed = SerializedBiscuit::from_slice(&bytes).unwrap();
        parsed.check_key_count().unwrap();
        parsed.verify().unwrap();

        parsed.check_root_key(root.public()).unwrap();
        assert_eq!(
            parsed.check_root_key(keypair.public()),
            Err(error::Format::UnknownPublicKey)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        match SerializedBiscuit::from_slice(b"not a token") {
            Err(error::Format::DeserializationError(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
