/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! helper functions and structures to create tokens and blocks
use super::{Biscuit, Block};
use crate::crypto::KeyPair;
use crate::datalog::{self, print_date, SymbolTable};
use crate::error;
use rand_core::{CryptoRng, RngCore};
use std::collections::HashSet;
use std::convert::{TryFrom, TryInto};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// the builders reuse the engine's definitions for constraints that do
// not reference the symbol table
pub use crate::datalog::{BytesConstraint, IntConstraint, StrConstraint};

/// a Datalog value in its public form, carrying strings instead of
/// symbol table indexes
///
/// conversion to the internal form interns the missing symbols; the
/// reverse conversion fails with `UnknownSymbol` on a dangling index
#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub enum Term {
    Symbol(String),
    Variable(String),
    Integer(i64),
    Str(String),
    Date(u64),
    Bytes(Vec<u8>),
}

impl Term {
    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Term {
        match self {
            Term::Symbol(s) => datalog::Term::Symbol(symbols.insert(s)),
            Term::Variable(s) => datalog::Term::Variable(symbols.insert(s) as u32),
            Term::Integer(i) => datalog::Term::Integer(*i),
            Term::Str(s) => datalog::Term::Str(s.clone()),
            Term::Date(d) => datalog::Term::Date(*d),
            Term::Bytes(b) => datalog::Term::Bytes(b.clone()),
        }
    }

    pub fn convert_from(term: &datalog::Term, symbols: &SymbolTable) -> Result<Self, error::Token> {
        Ok(match term {
            datalog::Term::Symbol(s) => Term::Symbol(
                symbols
                    .get_symbol(*s)
                    .ok_or(error::Token::UnknownSymbol(*s))?
                    .to_string(),
            ),
            datalog::Term::Variable(v) => Term::Variable(
                symbols
                    .get_symbol(*v as u64)
                    .ok_or(error::Token::UnknownSymbol(*v as u64))?
                    .to_string(),
            ),
            datalog::Term::Integer(i) => Term::Integer(*i),
            datalog::Term::Str(s) => Term::Str(s.clone()),
            datalog::Term::Date(d) => Term::Date(*d),
            datalog::Term::Bytes(b) => Term::Bytes(b.clone()),
        })
    }
}

impl From<&Term> for Term {
    fn from(t: &Term) -> Self {
        t.clone()
    }
}

impl AsRef<Term> for Term {
    fn as_ref(&self) -> &Term {
        self
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Symbol(s) => write!(f, "#{}", s),
            Term::Variable(s) => write!(f, "${}", s),
            Term::Integer(i) => write!(f, "{}", i),
            Term::Str(s) => write!(f, "\"{}\"", s),
            Term::Date(d) => write!(f, "{}", print_date(*d)),
            Term::Bytes(b) => write!(f, "hex:{}", hex::encode(b)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub struct Predicate {
    pub name: String,
    pub terms: Vec<Term>,
}

impl Predicate {
    pub fn new(name: &str, terms: &[Term]) -> Predicate {
        Predicate {
            name: name.to_string(),
            terms: terms.to_vec(),
        }
    }

    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Predicate {
        let name = symbols.insert(&self.name);
        let terms = self.terms.iter().map(|t| t.convert(symbols)).collect();

        datalog::Predicate { name, terms }
    }

    pub fn convert_from(
        p: &datalog::Predicate,
        symbols: &SymbolTable,
    ) -> Result<Self, error::Token> {
        Ok(Predicate {
            name: symbols
                .get_symbol(p.name)
                .ok_or(error::Token::UnknownSymbol(p.name))?
                .to_string(),
            terms: p
                .terms
                .iter()
                .map(|t| Term::convert_from(t, symbols))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl AsRef<Predicate> for Predicate {
    fn as_ref(&self) -> &Predicate {
        self
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self
            .terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}({})", self.name, terms.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub struct Fact(pub Predicate);

impl Fact {
    pub fn new(name: &str, terms: &[Term]) -> Fact {
        Fact(Predicate::new(name, terms))
    }

    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Fact {
        datalog::Fact {
            predicate: self.0.convert(symbols),
        }
    }

    pub fn convert_from(f: &datalog::Fact, symbols: &SymbolTable) -> Result<Self, error::Token> {
        Ok(Fact(Predicate::convert_from(&f.predicate, symbols)?))
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// constraint in public form, identifying its variable by name
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: String,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    Integer(IntConstraint),
    String(StrConstraint),
    Date(DateConstraint),
    Symbol(SymbolConstraint),
    Bytes(BytesConstraint),
}

/// public form of the date constraint; bounds stay strict
#[derive(Debug, Clone, PartialEq)]
pub enum DateConstraint {
    Before(SystemTime),
    After(SystemTime),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolConstraint {
    In(HashSet<String>),
    NotIn(HashSet<String>),
}

impl Constraint {
    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Constraint {
        // the symbol table will not grow to more than u32::MAX entries
        let id = symbols.insert(&self.id) as u32;

        let kind = match &self.kind {
            ConstraintKind::Integer(c) => datalog::ConstraintKind::Int(c.clone()),
            ConstraintKind::String(c) => datalog::ConstraintKind::Str(c.clone()),
            ConstraintKind::Bytes(c) => datalog::ConstraintKind::Bytes(c.clone()),
            ConstraintKind::Date(DateConstraint::Before(date)) => {
                let secs = date
                    .duration_since(UNIX_EPOCH)
                    .expect("date should be after the unix epoch")
                    .as_secs();
                datalog::ConstraintKind::Date(datalog::DateConstraint::Before(secs))
            }
            ConstraintKind::Date(DateConstraint::After(date)) => {
                let secs = date
                    .duration_since(UNIX_EPOCH)
                    .expect("date should be after the unix epoch")
                    .as_secs();
                datalog::ConstraintKind::Date(datalog::DateConstraint::After(secs))
            }
            ConstraintKind::Symbol(SymbolConstraint::In(set)) => {
                datalog::ConstraintKind::Symbol(datalog::SymbolConstraint::In(
                    set.iter().map(|s| symbols.insert(s)).collect(),
                ))
            }
            ConstraintKind::Symbol(SymbolConstraint::NotIn(set)) => {
                datalog::ConstraintKind::Symbol(datalog::SymbolConstraint::NotIn(
                    set.iter().map(|s| symbols.insert(s)).collect(),
                ))
            }
        };

        datalog::Constraint { id, kind }
    }

    pub fn convert_from(
        c: &datalog::Constraint,
        symbols: &SymbolTable,
    ) -> Result<Self, error::Token> {
        let id = symbols
            .get_symbol(c.id as u64)
            .ok_or(error::Token::UnknownSymbol(c.id as u64))?
            .to_string();

        let kind = match &c.kind {
            datalog::ConstraintKind::Int(c) => ConstraintKind::Integer(c.clone()),
            datalog::ConstraintKind::Str(c) => ConstraintKind::String(c.clone()),
            datalog::ConstraintKind::Bytes(c) => ConstraintKind::Bytes(c.clone()),
            datalog::ConstraintKind::Date(datalog::DateConstraint::Before(secs)) => {
                ConstraintKind::Date(DateConstraint::Before(
                    UNIX_EPOCH + std::time::Duration::from_secs(*secs),
                ))
            }
            datalog::ConstraintKind::Date(datalog::DateConstraint::After(secs)) => {
                ConstraintKind::Date(DateConstraint::After(
                    UNIX_EPOCH + std::time::Duration::from_secs(*secs),
                ))
            }
            datalog::ConstraintKind::Symbol(datalog::SymbolConstraint::In(set)) => {
                ConstraintKind::Symbol(SymbolConstraint::In(
                    set.iter()
                        .map(|s| {
                            symbols
                                .get_symbol(*s)
                                .map(|sym| sym.to_string())
                                .ok_or(error::Token::UnknownSymbol(*s))
                        })
                        .collect::<Result<_, _>>()?,
                ))
            }
            datalog::ConstraintKind::Symbol(datalog::SymbolConstraint::NotIn(set)) => {
                ConstraintKind::Symbol(SymbolConstraint::NotIn(
                    set.iter()
                        .map(|s| {
                            symbols
                                .get_symbol(*s)
                                .map(|sym| sym.to_string())
                                .ok_or(error::Token::UnknownSymbol(*s))
                        })
                        .collect::<Result<_, _>>()?,
                ))
            }
        };

        Ok(Constraint { id, kind })
    }
}

impl AsRef<Constraint> for Constraint {
    fn as_ref(&self) -> &Constraint {
        self
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConstraintKind::Integer(IntConstraint::LessThan(i)) => {
                write!(f, "${} < {}", self.id, i)
            }
            ConstraintKind::Integer(IntConstraint::GreaterThan(i)) => {
                write!(f, "${} > {}", self.id, i)
            }
            ConstraintKind::Integer(IntConstraint::LessOrEqual(i)) => {
                write!(f, "${} <= {}", self.id, i)
            }
            ConstraintKind::Integer(IntConstraint::GreaterOrEqual(i)) => {
                write!(f, "${} >= {}", self.id, i)
            }
            ConstraintKind::Integer(IntConstraint::Equal(i)) => write!(f, "${} == {}", self.id, i),
            ConstraintKind::Integer(IntConstraint::In(h)) => write!(f, "${} in {:?}", self.id, h),
            ConstraintKind::Integer(IntConstraint::NotIn(h)) => {
                write!(f, "${} not in {:?}", self.id, h)
            }
            ConstraintKind::String(StrConstraint::Prefix(s)) => {
                write!(f, "${} starts_with \"{}\"", self.id, s)
            }
            ConstraintKind::String(StrConstraint::Suffix(s)) => {
                write!(f, "${} ends_with \"{}\"", self.id, s)
            }
            ConstraintKind::String(StrConstraint::Equal(s)) => {
                write!(f, "${} == \"{}\"", self.id, s)
            }
            ConstraintKind::String(StrConstraint::Regex(s)) => {
                write!(f, "${} matches /{}/", self.id, s)
            }
            ConstraintKind::String(StrConstraint::In(h)) => write!(f, "${} in {:?}", self.id, h),
            ConstraintKind::String(StrConstraint::NotIn(h)) => {
                write!(f, "${} not in {:?}", self.id, h)
            }
            ConstraintKind::Date(DateConstraint::Before(date)) => {
                let secs = date
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                write!(f, "${} < {}", self.id, print_date(secs))
            }
            ConstraintKind::Date(DateConstraint::After(date)) => {
                let secs = date
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                write!(f, "${} > {}", self.id, print_date(secs))
            }
            ConstraintKind::Symbol(SymbolConstraint::In(h)) => {
                write!(f, "${} in {:?}", self.id, h)
            }
            ConstraintKind::Symbol(SymbolConstraint::NotIn(h)) => {
                write!(f, "${} not in {:?}", self.id, h)
            }
            ConstraintKind::Bytes(BytesConstraint::Equal(b)) => {
                write!(f, "${} == hex:{}", self.id, hex::encode(b))
            }
            ConstraintKind::Bytes(BytesConstraint::In(h)) => {
                let set = h
                    .iter()
                    .map(|b| format!("hex:{}", hex::encode(b)))
                    .collect::<Vec<_>>();
                write!(f, "${} in {:?}", self.id, set)
            }
            ConstraintKind::Bytes(BytesConstraint::NotIn(h)) => {
                let set = h
                    .iter()
                    .map(|b| format!("hex:{}", hex::encode(b)))
                    .collect::<Vec<_>>();
                write!(f, "${} not in {:?}", self.id, set)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub head: Predicate,
    pub body: Vec<Predicate>,
    pub constraints: Vec<Constraint>,
}

impl Rule {
    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Rule {
        datalog::Rule {
            head: self.head.convert(symbols),
            body: self.body.iter().map(|p| p.convert(symbols)).collect(),
            constraints: self
                .constraints
                .iter()
                .map(|c| c.convert(symbols))
                .collect(),
        }
    }

    pub fn convert_from(r: &datalog::Rule, symbols: &SymbolTable) -> Result<Self, error::Token> {
        Ok(Rule {
            head: Predicate::convert_from(&r.head, symbols)?,
            body: r
                .body
                .iter()
                .map(|p| Predicate::convert_from(p, symbols))
                .collect::<Result<_, _>>()?,
            constraints: r
                .constraints
                .iter()
                .map(|c| Constraint::convert_from(c, symbols))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .body
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>();
        write!(f, "{} <- {}", self.head, body.join(", "))?;

        if !self.constraints.is_empty() {
            let constraints = self
                .constraints
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>();
            write!(f, " @ {}", constraints.join(", "))?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Caveat {
    pub queries: Vec<Rule>,
}

impl Caveat {
    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Caveat {
        datalog::Caveat {
            queries: self.queries.iter().map(|q| q.convert(symbols)).collect(),
        }
    }

    pub fn convert_from(c: &datalog::Caveat, symbols: &SymbolTable) -> Result<Self, error::Token> {
        Ok(Caveat {
            queries: c
                .queries
                .iter()
                .map(|q| Rule::convert_from(q, symbols))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<Rule> for Caveat {
    type Error = error::Token;

    fn try_from(value: Rule) -> Result<Self, Self::Error> {
        Ok(Caveat {
            queries: vec![value],
        })
    }
}

impl TryFrom<&[Rule]> for Caveat {
    type Error = error::Token;

    fn try_from(values: &[Rule]) -> Result<Self, Self::Error> {
        Ok(Caveat {
            queries: values.to_vec(),
        })
    }
}

impl fmt::Display for Caveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queries = self
            .queries
            .iter()
            .map(|q| q.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", queries.join(" || "))
    }
}

/// builder for the authority block of a new token
///
/// authority facts and rule heads are tagged with the `#authority`
/// symbol as their first term; it is prepended when missing
pub struct BiscuitBuilder<'a> {
    root: &'a KeyPair,
    symbols_start: usize,
    symbols: SymbolTable,
    facts: Vec<datalog::Fact>,
    rules: Vec<datalog::Rule>,
    caveats: Vec<datalog::Caveat>,
    context: Option<String>,
}

impl<'a> BiscuitBuilder<'a> {
    pub fn new(root: &'a KeyPair, base_symbols: SymbolTable) -> BiscuitBuilder<'a> {
        BiscuitBuilder {
            root,
            symbols_start: base_symbols.len(),
            symbols: base_symbols,
            facts: vec![],
            rules: vec![],
            caveats: vec![],
            context: None,
        }
    }

    pub fn add_authority_fact<F: TryInto<Fact>>(&mut self, fact: F) -> Result<(), error::Token> {
        let mut fact = fact.try_into().map_err(|_| error::Token::ParseError)?;

        let authority = Term::Symbol("authority".to_string());
        match fact.0.terms.first() {
            Some(term) if *term == authority => {}
            _ => fact.0.terms.insert(0, authority),
        }

        let converted = fact.convert(&mut self.symbols);
        if self.facts.contains(&converted) {
            return Err(error::Token::DuplicateFact(fact.to_string()));
        }

        self.facts.push(converted);
        Ok(())
    }

    pub fn add_authority_rule<R: TryInto<Rule>>(&mut self, rule: R) -> Result<(), error::Token> {
        let mut rule = rule.try_into().map_err(|_| error::Token::ParseError)?;

        let authority = Term::Symbol("authority".to_string());
        match rule.head.terms.first() {
            Some(term) if *term == authority => {}
            _ => rule.head.terms.insert(0, authority),
        }

        self.rules.push(rule.convert(&mut self.symbols));
        Ok(())
    }

    pub fn add_authority_caveat<R: TryInto<Rule>>(&mut self, rule: R) -> Result<(), error::Token> {
        let rule = rule.try_into().map_err(|_| error::Token::ParseError)?;
        self.caveats.push(datalog::Caveat {
            queries: vec![rule.convert(&mut self.symbols)],
        });
        Ok(())
    }

    /// adds a `right(#authority, resource, right)` fact
    pub fn add_right(&mut self, resource: &str, right: &str) {
        let _ = self.add_authority_fact(fact("right", &[string(resource), s(right)]));
    }

    pub fn set_context(&mut self, context: String) {
        self.context = Some(context);
    }

    pub fn build(self) -> Result<Biscuit, error::Token> {
        self.build_with_rng(&mut rand::rngs::OsRng)
    }

    pub fn build_with_rng<T: RngCore + CryptoRng>(
        mut self,
        rng: &mut T,
    ) -> Result<Biscuit, error::Token> {
        let new_symbols = self.symbols.split_off(self.symbols_start);

        let authority = Block {
            index: 0,
            symbols: new_symbols,
            facts: self.facts,
            rules: self.rules,
            caveats: self.caveats,
            context: self.context,
        };

        Biscuit::new_with_rng(rng, self.root, self.symbols, authority)
    }
}

/// builder for an attenuation block
///
/// contrary to [BiscuitBuilder], facts and rules are not tagged with
/// `#authority`: an attenuation block cannot claim new rights
#[derive(Clone, Debug, Default)]
pub struct BlockBuilder {
    pub index: u32,
    facts: Vec<Fact>,
    rules: Vec<Rule>,
    caveats: Vec<Caveat>,
    context: Option<String>,
}

impl BlockBuilder {
    pub fn new(index: u32) -> BlockBuilder {
        BlockBuilder {
            index,
            ..Default::default()
        }
    }

    pub fn add_fact<F: TryInto<Fact>>(&mut self, fact: F) -> Result<(), error::Token> {
        let fact = fact.try_into().map_err(|_| error::Token::ParseError)?;
        if self.facts.contains(&fact) {
            return Err(error::Token::DuplicateFact(fact.to_string()));
        }

        self.facts.push(fact);
        Ok(())
    }

    pub fn add_rule<R: TryInto<Rule>>(&mut self, rule: R) -> Result<(), error::Token> {
        let rule = rule.try_into().map_err(|_| error::Token::ParseError)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn add_caveat<C: TryInto<Caveat>>(&mut self, caveat: C) -> Result<(), error::Token> {
        let caveat = caveat.try_into().map_err(|_| error::Token::ParseError)?;
        self.caveats.push(caveat);
        Ok(())
    }

    pub fn set_context(&mut self, context: String) {
        self.context = Some(context);
    }

    pub fn build(self, mut symbols: SymbolTable) -> Block {
        let symbols_start = symbols.len();

        let facts = self
            .facts
            .iter()
            .map(|f| f.convert(&mut symbols))
            .collect();
        let rules = self
            .rules
            .iter()
            .map(|r| r.convert(&mut symbols))
            .collect();
        let caveats = self
            .caveats
            .iter()
            .map(|c| c.convert(&mut symbols))
            .collect();

        let new_symbols = symbols.split_off(symbols_start);

        Block {
            index: self.index,
            symbols: new_symbols,
            facts,
            rules,
            caveats,
            context: self.context,
        }
    }

    /// caveat requiring the current operation right on the resource
    pub fn check_right(&mut self, right: &str) {
        let caveat = rule(
            "check_right",
            &[s(right)],
            &[
                pred("resource", &[s("ambient"), var("resource_name")]),
                pred("operation", &[s("ambient"), s(right)]),
                pred("right", &[s("authority"), var("resource_name"), s(right)]),
            ],
        );

        let _ = self.add_caveat(caveat);
    }

    /// caveat restricting the token to a single resource
    pub fn check_resource(&mut self, resource: &str) {
        let caveat = rule(
            "resource_check",
            &[s("resource_check")],
            &[pred("resource", &[s("ambient"), string(resource)])],
        );

        let _ = self.add_caveat(caveat);
    }

    /// caveat restricting the token to a single operation
    pub fn check_operation(&mut self, operation: &str) {
        let caveat = rule(
            "operation_check",
            &[s("operation_check")],
            &[pred("operation", &[s("ambient"), s(operation)])],
        );

        let _ = self.add_caveat(caveat);
    }

    pub fn resource_prefix(&mut self, prefix: &str) {
        let caveat = constrained_rule(
            "prefix",
            &[var("resource")],
            &[pred("resource", &[s("ambient"), var("resource")])],
            &[Constraint {
                id: "resource".to_string(),
                kind: ConstraintKind::String(StrConstraint::Prefix(prefix.to_string())),
            }],
        );

        let _ = self.add_caveat(caveat);
    }

    pub fn resource_suffix(&mut self, suffix: &str) {
        let caveat = constrained_rule(
            "suffix",
            &[var("resource")],
            &[pred("resource", &[s("ambient"), var("resource")])],
            &[Constraint {
                id: "resource".to_string(),
                kind: ConstraintKind::String(StrConstraint::Suffix(suffix.to_string())),
            }],
        );

        let _ = self.add_caveat(caveat);
    }

    /// caveat failing once the ambient time passes the expiration date
    pub fn expiration_date(&mut self, date: SystemTime) {
        let caveat = constrained_rule(
            "expiration",
            &[var("date")],
            &[pred("time", &[s("ambient"), var("date")])],
            &[Constraint {
                id: "date".to_string(),
                kind: ConstraintKind::Date(DateConstraint::Before(date)),
            }],
        );

        let _ = self.add_caveat(caveat);
    }
}

/// creates a new fact
pub fn fact<T: AsRef<Term>>(name: &str, terms: &[T]) -> Fact {
    Fact(pred(name, terms))
}

/// creates a predicate
pub fn pred<T: AsRef<Term>>(name: &str, terms: &[T]) -> Predicate {
    Predicate {
        name: name.to_string(),
        terms: terms.iter().map(|t| t.as_ref().clone()).collect(),
    }
}

/// creates a rule
pub fn rule<T: AsRef<Term>, P: AsRef<Predicate>>(
    head_name: &str,
    head_terms: &[T],
    body: &[P],
) -> Rule {
    Rule {
        head: pred(head_name, head_terms),
        body: body.iter().map(|p| p.as_ref().clone()).collect(),
        constraints: Vec::new(),
    }
}

/// creates a rule with constraints
pub fn constrained_rule<T: AsRef<Term>, P: AsRef<Predicate>, C: AsRef<Constraint>>(
    head_name: &str,
    head_terms: &[T],
    body: &[P],
    constraints: &[C],
) -> Rule {
    Rule {
        head: pred(head_name, head_terms),
        body: body.iter().map(|p| p.as_ref().clone()).collect(),
        constraints: constraints.iter().map(|c| c.as_ref().clone()).collect(),
    }
}

/// creates an integer value
pub fn int(i: i64) -> Term {
    Term::Integer(i)
}

/// creates a string value
pub fn string(s: &str) -> Term {
    Term::Str(s.to_string())
}

/// creates a symbol
///
/// the symbol is interned when the enclosing block is built
pub fn s(s: &str) -> Term {
    Term::Symbol(s.to_string())
}

/// creates a symbol
pub fn symbol(s: &str) -> Term {
    Term::Symbol(s.to_string())
}

/// creates a date value, stored as seconds since the unix epoch
pub fn date(t: &SystemTime) -> Term {
    let dur = t
        .duration_since(UNIX_EPOCH)
        .expect("date should be after the unix epoch");
    Term::Date(dur.as_secs())
}

/// creates a variable for a rule
pub fn var(s: &str) -> Term {
    Term::Variable(s.to_string())
}

/// creates a variable for a rule
pub fn variable(s: &str) -> Term {
    Term::Variable(s.to_string())
}

/// creates a byte array value
pub fn bytes(b: &[u8]) -> Term {
    Term::Bytes(b.to_vec())
}
