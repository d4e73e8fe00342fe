/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! main structures to interact with Biscuit tokens
use std::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::crypto::{KeyPair, PublicKey};
use crate::datalog::{self, SymbolTable, Term, World};
use crate::error;
use crate::format::{self, SerializedBiscuit};
use builder::{BiscuitBuilder, BlockBuilder};

pub mod builder;
pub mod verifier;
pub use verifier::Verifier;

/// some symbols are predefined and available in every implementation, to avoid
/// transmitting them with every token
///
/// tokens rely on these indexes being stable between the issuing and the
/// verifying party, so the table is cloned for every new token, never
/// mutated in place
pub fn default_symbol_table() -> SymbolTable {
    let mut syms = SymbolTable::new();
    syms.insert("authority");
    syms.insert("ambient");
    syms.insert("resource");
    syms.insert("operation");
    syms.insert("time");

    syms
}

/// a block contained in a token
///
/// a block carries the symbols it introduced, on top of those already
/// defined by the preceding blocks
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// position of the block in the token, 0 for the authority block
    pub index: u32,
    /// symbols introduced by this block
    pub symbols: SymbolTable,
    /// facts provided by this block
    pub facts: Vec<datalog::Fact>,
    /// rules provided by this block
    pub rules: Vec<datalog::Rule>,
    /// caveats that the token and ambient data must validate
    pub caveats: Vec<datalog::Caveat>,
    /// free form application data, excluded from the logic
    pub context: Option<String>,
}

/// This structure represents a valid Biscuit token
///
/// It contains multiple `Block` elements, the associated symbol table,
/// and a serialized version of this data
///
/// ```rust
/// use biscuit::{builder::*, Biscuit, KeyPair};
/// use rand::prelude::StdRng;
/// use rand_core::SeedableRng;
///
/// fn main() -> Result<(), biscuit::error::Token> {
///   let mut rng: StdRng = SeedableRng::seed_from_u64(0);
///   let root = KeyPair::new(&mut rng);
///
///   // the authority block defines the initial rights
///   let mut builder = Biscuit::builder(&root);
///   builder.add_authority_fact(fact("right", &[string("/a/file1.txt"), s("read")]))?;
///   let token1 = builder.build_with_rng(&mut rng)?;
///
///   // the token can be restricted with a new block
///   let keypair2 = KeyPair::new(&mut rng);
///   let mut block_builder = token1.create_block();
///   block_builder.check_operation("read");
///
///   let token2 = token1.append(&mut rng, &keypair2, block_builder)?;
///
///   Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Biscuit {
    authority: Block,
    blocks: Vec<Block>,
    symbols: SymbolTable,
    container: SerializedBiscuit,
}

impl Biscuit {
    /// creates a builder for the authority block, using the default
    /// symbol table
    pub fn builder(root: &KeyPair) -> BiscuitBuilder {
        Biscuit::builder_with_symbols(root, default_symbol_table())
    }

    pub fn builder_with_symbols(root: &KeyPair, base_symbols: SymbolTable) -> BiscuitBuilder {
        BiscuitBuilder::new(root, base_symbols)
    }

    pub(crate) fn new_with_rng<T: RngCore + CryptoRng>(
        rng: &mut T,
        root: &KeyPair,
        mut symbols: SymbolTable,
        authority: Block,
    ) -> Result<Biscuit, error::Token> {
        if authority.index != 0 {
            return Err(error::Token::InvalidAuthorityIndex(authority.index));
        }

        if !symbols.is_disjoint(&authority.symbols) {
            return Err(error::Token::SymbolTableOverlap);
        }

        let container =
            SerializedBiscuit::new(rng, root, &authority).map_err(error::Token::Format)?;

        symbols.extend(&authority.symbols);

        Ok(Biscuit {
            authority,
            blocks: vec![],
            symbols,
            container,
        })
    }

    /// deserializes a token and validates its structure and signature
    /// against the default symbol table
    ///
    /// the root public key is only checked when creating a [Verifier]
    pub fn from(slice: &[u8]) -> Result<Self, error::Token> {
        Biscuit::from_with_symbols(slice, default_symbol_table())
    }

    /// deserializes a token, rebuilding the symbol table from the
    /// provided base and each block's delta, in block order
    pub fn from_with_symbols(
        slice: &[u8],
        mut symbols: SymbolTable,
    ) -> Result<Self, error::Token> {
        let container = SerializedBiscuit::from_slice(slice).map_err(error::Token::Format)?;

        let authority =
            format::deserialize_block(&container.authority).map_err(error::Token::Format)?;
        if authority.index != 0 {
            return Err(error::Token::InvalidAuthorityIndex(authority.index));
        }

        let mut blocks = Vec::with_capacity(container.blocks.len());
        for (i, bytes) in container.blocks.iter().enumerate() {
            let block = format::deserialize_block(bytes).map_err(error::Token::Format)?;
            let expected = (i + 1) as u32;
            if block.index != expected {
                return Err(error::Token::InvalidBlockIndex(error::InvalidBlockIndex {
                    expected,
                    found: block.index,
                }));
            }
            blocks.push(block);
        }

        container.check_key_count().map_err(error::Token::Format)?;
        container.verify().map_err(error::Token::Format)?;

        if !symbols.is_disjoint(&authority.symbols) {
            return Err(error::Token::SymbolTableOverlap);
        }
        symbols.extend(&authority.symbols);

        for block in blocks.iter() {
            if !symbols.is_disjoint(&block.symbols) {
                return Err(error::Token::SymbolTableOverlap);
            }
            symbols.extend(&block.symbols);
        }

        Ok(Biscuit {
            authority,
            blocks,
            symbols,
            container,
        })
    }

    /// deserializes a token from a (URL safe) base64 string
    pub fn from_base64<T: AsRef<[u8]>>(slice: T) -> Result<Self, error::Token> {
        Biscuit::from_base64_with_symbols(slice, default_symbol_table())
    }

    pub fn from_base64_with_symbols<T: AsRef<[u8]>>(
        slice: T,
        symbols: SymbolTable,
    ) -> Result<Self, error::Token> {
        let decoded = base64::decode_config(slice, base64::URL_SAFE).map_err(|e| {
            error::Token::Format(error::Format::DeserializationError(format!(
                "base64 decoding error: {:?}",
                e
            )))
        })?;

        Biscuit::from_with_symbols(&decoded, symbols)
    }

    /// serializes the token
    pub fn to_vec(&self) -> Result<Vec<u8>, error::Token> {
        self.container.to_vec().map_err(error::Token::Format)
    }

    /// serializes the token and encodes it to a (URL safe) base64 string
    pub fn to_base64(&self) -> Result<String, error::Token> {
        self.to_vec()
            .map(|v| base64::encode_config(v, base64::URL_SAFE))
    }

    pub fn serialized_size(&self) -> usize {
        self.container.serialized_size()
    }

    /// creates a verifier from this token, refusing roots that did not
    /// sign the authority block
    pub fn verify(&self, root: PublicKey) -> Result<Verifier<'_>, error::Token> {
        self.container
            .check_root_key(root)
            .map_err(error::Token::Format)?;

        Verifier::new(self)
    }

    /// creates the builder for the next attenuation block
    pub fn create_block(&self) -> BlockBuilder {
        BlockBuilder::new((1 + self.blocks.len()) as u32)
    }

    /// adds a new block to the token
    ///
    /// the block is signed under `keypair`, whose public key becomes part
    /// of the token; prior block bytes are reused as stored so their
    /// signatures remain valid
    pub fn append<T: RngCore + CryptoRng>(
        &self,
        rng: &mut T,
        keypair: &KeyPair,
        block_builder: BlockBuilder,
    ) -> Result<Self, error::Token> {
        let block = block_builder.build(self.symbols.clone());

        let expected = (1 + self.blocks.len()) as u32;
        if block.index != expected {
            return Err(error::Token::InvalidBlockIndex(error::InvalidBlockIndex {
                expected,
                found: block.index,
            }));
        }

        if !self.symbols.is_disjoint(&block.symbols) {
            return Err(error::Token::SymbolTableOverlap);
        }

        let mut symbols = self.symbols.clone();
        symbols.extend(&block.symbols);

        // an attenuation block cannot provide authority or ambient facts
        let reserved = [symbols.get("authority"), symbols.get("ambient")];
        for fact in block.facts.iter() {
            if let Some(Term::Symbol(id)) = fact.predicate.terms.first() {
                if reserved.contains(&Some(*id)) {
                    return Err(error::Token::FailedLogic(error::Logic::InvalidBlockFact(
                        block.index,
                        symbols.print_fact(fact),
                    )));
                }
            }
        }

        let container = self
            .container
            .append(rng, keypair, &block)
            .map_err(error::Token::Format)?;

        let mut blocks = self.blocks.clone();
        blocks.push(block);

        Ok(Biscuit {
            authority: self.authority.clone(),
            blocks,
            symbols,
            container,
        })
    }

    /// returns the index of the first block providing a fact with this
    /// name, the authority block being index 0
    pub fn block_index_by_fact_name(&self, name: &str) -> Result<usize, error::Token> {
        let id = self
            .symbols
            .get(name)
            .ok_or_else(|| error::Token::FactNotFound(name.to_string()))?;

        if self.authority.facts.iter().any(|f| f.predicate.name == id) {
            return Ok(0);
        }

        for (i, block) in self.blocks.iter().enumerate() {
            if block.facts.iter().any(|f| f.predicate.name == id) {
                return Ok(i + 1);
            }
        }

        Err(error::Token::FactNotFound(name.to_string()))
    }

    /// builds the base world from every block's facts and rules
    pub(crate) fn generate_world(&self) -> Result<World, error::Token> {
        let authority_id = self
            .symbols
            .get("authority")
            .ok_or(error::Token::MissingSymbols)?;
        let ambient_id = self
            .symbols
            .get("ambient")
            .ok_or(error::Token::MissingSymbols)?;

        let mut world = World::new();

        for fact in self.authority.facts.iter() {
            if fact.predicate.terms.first() != Some(&Term::Symbol(authority_id)) {
                return Err(error::Token::FailedLogic(
                    error::Logic::InvalidAuthorityFact(self.symbols.print_fact(fact)),
                ));
            }
            world.add_fact(fact.clone());
        }

        for rule in self.authority.rules.iter() {
            world.add_rule(rule.clone());
        }

        for (i, block) in self.blocks.iter().enumerate() {
            for fact in block.facts.iter() {
                match fact.predicate.terms.first() {
                    Some(Term::Symbol(id)) if *id == authority_id || *id == ambient_id => {
                        return Err(error::Token::FailedLogic(error::Logic::InvalidBlockFact(
                            (i + 1) as u32,
                            self.symbols.print_fact(fact),
                        )));
                    }
                    _ => world.add_fact(fact.clone()),
                }
            }

            for rule in block.rules.iter() {
                world.add_rule(rule.clone());
            }
        }

        Ok(world)
    }

    /// returns the number of blocks, authority included
    pub fn block_count(&self) -> usize {
        1 + self.blocks.len()
    }

    /// returns the list of context elements of each block
    ///
    /// the context is a free form text field in which application
    /// specific data can be stored
    pub fn context(&self) -> Vec<Option<String>> {
        let mut res = vec![self.authority.context.clone()];

        for block in self.blocks.iter() {
            res.push(block.context.clone());
        }

        res
    }

    /// pretty printer for this token
    pub fn print(&self) -> String {
        format!("{}", self)
    }

    fn print_block(&self, block: &Block) -> String {
        let facts: Vec<_> = block
            .facts
            .iter()
            .map(|f| self.symbols.print_fact(f))
            .collect();
        let rules: Vec<_> = block
            .rules
            .iter()
            .map(|r| self.symbols.print_rule(r))
            .collect();
        let caveats: Vec<_> = block
            .caveats
            .iter()
            .map(|c| self.symbols.print_caveat(c))
            .collect();

        format!(
            "Block[{}] {{\n\t\tsymbols: {:?}\n\t\tcontext: {:?}\n\t\tfacts: {:?}\n\t\trules: {:?}\n\t\tcaveats: {:?}\n\t}}",
            block.index, block.symbols.symbols, block.context, facts, rules, caveats
        )
    }
}

impl fmt::Display for Biscuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Biscuit {{")?;
        writeln!(f, "\tsymbols: {:?}", self.symbols.symbols)?;
        writeln!(f, "\tauthority: {}", self.print_block(&self.authority))?;
        for block in self.blocks.iter() {
            writeln!(f, "\tblock: {}", self.print_block(block))?;
        }
        write!(f, "}}")
    }
}
