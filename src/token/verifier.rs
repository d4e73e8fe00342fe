/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! token verification against ambient data
use std::convert::TryInto;
use std::iter::once;
use std::time::SystemTime;

use super::builder::{date, fact, s, string, Fact, Rule};
use super::Biscuit;
use crate::datalog::{RunLimits, SymbolTable, World};
use crate::error;

/// verifies a token by mixing its blocks with ambient data and caveats
///
/// the verifier seeds the world with every block's facts and rules, then
/// keeps a snapshot so [`Verifier::reset`] can restore the initial state
pub struct Verifier<'a> {
    token: &'a Biscuit,
    base_world: World,
    base_symbols: SymbolTable,
    world: World,
    symbols: SymbolTable,
    caveats: Vec<Rule>,
}

impl<'a> Verifier<'a> {
    pub(crate) fn new(token: &'a Biscuit) -> Result<Self, error::Token> {
        let world = token.generate_world()?;
        let symbols = token.symbols.clone();

        Ok(Verifier {
            token,
            base_world: world.clone(),
            base_symbols: symbols.clone(),
            world,
            symbols,
            caveats: vec![],
        })
    }

    /// adds an ambient fact, like `resource(#ambient, "file1")`
    pub fn add_fact<F: TryInto<Fact>>(&mut self, fact: F) -> Result<(), error::Token> {
        let fact = fact.try_into().map_err(|_| error::Token::ParseError)?;
        self.world.add_fact(fact.convert(&mut self.symbols));
        Ok(())
    }

    pub fn add_rule<R: TryInto<Rule>>(&mut self, rule: R) -> Result<(), error::Token> {
        let rule = rule.try_into().map_err(|_| error::Token::ParseError)?;
        self.world.add_rule(rule.convert(&mut self.symbols));
        Ok(())
    }

    /// adds a verification requirement: the query must produce at least
    /// one fact for [`Verifier::verify`] to succeed
    pub fn add_caveat<R: TryInto<Rule>>(&mut self, caveat: R) -> Result<(), error::Token> {
        let caveat = caveat.try_into().map_err(|_| error::Token::ParseError)?;
        self.caveats.push(caveat);
        Ok(())
    }

    /// adds the `resource(#ambient, resource)` fact describing the request
    pub fn add_resource(&mut self, resource: &str) {
        let fact = fact("resource", &[s("ambient"), string(resource)]);
        self.world.add_fact(fact.convert(&mut self.symbols));
    }

    /// adds the `operation(#ambient, #operation)` fact describing the request
    pub fn add_operation(&mut self, operation: &str) {
        let fact = fact("operation", &[s("ambient"), s(operation)]);
        self.world.add_fact(fact.convert(&mut self.symbols));
    }

    /// adds the `time(#ambient, date)` fact describing the request
    pub fn set_time(&mut self, time: SystemTime) {
        let fact = fact("time", &[s("ambient"), date(&time)]);
        self.world.add_fact(fact.convert(&mut self.symbols));
    }

    /// runs the world and tests every caveat, verifier caveats first,
    /// then block caveats in block order
    ///
    /// all failing caveats are accumulated and reported in one error;
    /// calling `verify` again without modification returns the same result
    pub fn verify(&mut self) -> Result<(), error::Token> {
        self.verify_with_limits(RunLimits::default())
    }

    pub fn verify_with_limits(&mut self, limits: RunLimits) -> Result<(), error::Token> {
        if self.symbols.get("authority").is_none() || self.symbols.get("ambient").is_none() {
            return Err(error::Token::MissingSymbols);
        }

        self.world.run_with_limits(limits)?;

        let mut errors = vec![];

        let verifier_caveats = self.caveats.clone();
        for (i, caveat) in verifier_caveats.iter().enumerate() {
            let query = caveat.convert(&mut self.symbols);
            if self.world.query_rule(query.clone()).is_empty() {
                errors.push(error::FailedCaveat::Verifier(error::FailedVerifierCaveat {
                    caveat_id: i as u32,
                    rule: self.symbols.print_rule(&query),
                }));
            }
        }

        let blocks = once(&self.token.authority).chain(self.token.blocks.iter());
        for (block_id, block) in blocks.enumerate() {
            for (caveat_id, caveat) in block.caveats.iter().enumerate() {
                let successful = caveat
                    .queries
                    .iter()
                    .any(|query| !self.world.query_rule(query.clone()).is_empty());

                if !successful {
                    errors.push(error::FailedCaveat::Block(error::FailedBlockCaveat {
                        block_id: block_id as u32,
                        caveat_id: caveat_id as u32,
                        rule: self.symbols.print_caveat(caveat),
                    }));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(error::Token::FailedLogic(error::Logic::FailedCaveats(
                errors,
            )))
        }
    }

    /// runs a query against the world and returns the produced facts
    ///
    /// the world is saturated first; running it again on a saturated
    /// world derives nothing, so queries can come before or after
    /// [`Verifier::verify`]
    pub fn query<R: TryInto<Rule>>(&mut self, rule: R) -> Result<Vec<Fact>, error::Token> {
        let rule = rule.try_into().map_err(|_| error::Token::ParseError)?;

        self.world.run_with_limits(RunLimits::default())?;

        let query = rule.convert(&mut self.symbols);
        self.world
            .query_rule(query)
            .iter()
            .map(|f| Fact::convert_from(f, &self.symbols))
            .collect()
    }

    /// returns the index of the first block providing a fact with this
    /// name, the authority block being index 0
    pub fn block_index_by_fact_name(&self, name: &str) -> Result<usize, error::Token> {
        self.token.block_index_by_fact_name(name)
    }

    /// restores the world and symbols to the token's base state and
    /// drops the verifier side caveats
    pub fn reset(&mut self) {
        self.world = self.base_world.clone();
        self.symbols = self.base_symbols.clone();
        self.caveats.clear();
    }
}
