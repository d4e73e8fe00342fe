/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! helper functions for conversion between internal structures and Protobuf
use super::schema;
use crate::datalog::*;
use crate::error;
use crate::token::Block;

pub fn token_block_to_proto_block(input: &Block) -> schema::Block {
    schema::Block {
        index: input.index,
        symbols: input.symbols.symbols.clone(),
        facts: input.facts.iter().map(token_fact_to_proto_fact).collect(),
        rules: input.rules.iter().map(token_rule_to_proto_rule).collect(),
        caveats: input
            .caveats
            .iter()
            .map(token_caveat_to_proto_caveat)
            .collect(),
        context: input.context.clone(),
    }
}

pub fn proto_block_to_token_block(input: &schema::Block) -> Result<Block, error::Format> {
    let mut facts = Vec::with_capacity(input.facts.len());
    for fact in input.facts.iter() {
        facts.push(proto_fact_to_token_fact(fact)?);
    }

    let mut rules = Vec::with_capacity(input.rules.len());
    for rule in input.rules.iter() {
        rules.push(proto_rule_to_token_rule(rule)?);
    }

    let mut caveats = Vec::with_capacity(input.caveats.len());
    for caveat in input.caveats.iter() {
        caveats.push(proto_caveat_to_token_caveat(caveat)?);
    }

    Ok(Block {
        index: input.index,
        symbols: SymbolTable {
            symbols: input.symbols.clone(),
        },
        facts,
        rules,
        caveats,
        context: input.context.clone(),
    })
}

pub fn token_fact_to_proto_fact(input: &Fact) -> schema::Fact {
    schema::Fact {
        predicate: token_predicate_to_proto_predicate(&input.predicate),
    }
}

pub fn proto_fact_to_token_fact(input: &schema::Fact) -> Result<Fact, error::Format> {
    Ok(Fact {
        predicate: proto_predicate_to_token_predicate(&input.predicate)?,
    })
}

pub fn token_rule_to_proto_rule(input: &Rule) -> schema::Rule {
    schema::Rule {
        head: token_predicate_to_proto_predicate(&input.head),
        body: input
            .body
            .iter()
            .map(token_predicate_to_proto_predicate)
            .collect(),
        constraints: input
            .constraints
            .iter()
            .map(token_constraint_to_proto_constraint)
            .collect(),
    }
}

pub fn proto_rule_to_token_rule(input: &schema::Rule) -> Result<Rule, error::Format> {
    let head = proto_predicate_to_token_predicate(&input.head)?;

    let mut body = Vec::with_capacity(input.body.len());
    for predicate in input.body.iter() {
        body.push(proto_predicate_to_token_predicate(predicate)?);
    }

    let mut constraints = Vec::with_capacity(input.constraints.len());
    for constraint in input.constraints.iter() {
        constraints.push(proto_constraint_to_token_constraint(constraint)?);
    }

    Ok(Rule {
        head,
        body,
        constraints,
    })
}

pub fn token_caveat_to_proto_caveat(input: &Caveat) -> schema::Caveat {
    schema::Caveat {
        queries: input.queries.iter().map(token_rule_to_proto_rule).collect(),
    }
}

pub fn proto_caveat_to_token_caveat(input: &schema::Caveat) -> Result<Caveat, error::Format> {
    let mut queries = Vec::with_capacity(input.queries.len());
    for query in input.queries.iter() {
        queries.push(proto_rule_to_token_rule(query)?);
    }

    Ok(Caveat { queries })
}

pub fn token_predicate_to_proto_predicate(input: &Predicate) -> schema::Predicate {
    schema::Predicate {
        name: input.name,
        terms: input.terms.iter().map(token_term_to_proto_term).collect(),
    }
}

pub fn proto_predicate_to_token_predicate(
    input: &schema::Predicate,
) -> Result<Predicate, error::Format> {
    let mut terms = Vec::with_capacity(input.terms.len());
    for term in input.terms.iter() {
        terms.push(proto_term_to_token_term(term)?);
    }

    Ok(Predicate {
        name: input.name,
        terms,
    })
}

pub fn token_term_to_proto_term(input: &Term) -> schema::Term {
    use schema::term::Content;

    schema::Term {
        content: Some(match input {
            Term::Symbol(s) => Content::Symbol(*s),
            Term::Variable(v) => Content::Variable(*v),
            Term::Integer(i) => Content::Integer(*i),
            Term::Str(s) => Content::String(s.clone()),
            Term::Date(d) => Content::Date(*d),
            Term::Bytes(b) => Content::Bytes(b.clone()),
        }),
    }
}

pub fn proto_term_to_token_term(input: &schema::Term) -> Result<Term, error::Format> {
    use schema::term::Content;

    match &input.content {
        Some(Content::Symbol(s)) => Ok(Term::Symbol(*s)),
        Some(Content::Variable(v)) => Ok(Term::Variable(*v)),
        Some(Content::Integer(i)) => Ok(Term::Integer(*i)),
        Some(Content::String(s)) => Ok(Term::Str(s.clone())),
        Some(Content::Date(d)) => Ok(Term::Date(*d)),
        Some(Content::Bytes(b)) => Ok(Term::Bytes(b.clone())),
        None => Err(error::Format::DeserializationError(
            "empty term".to_string(),
        )),
    }
}

pub fn token_constraint_to_proto_constraint(input: &Constraint) -> schema::Constraint {
    use schema::constraint::Kind;

    schema::Constraint {
        id: input.id,
        kind: Some(match &input.kind {
            ConstraintKind::Int(c) => Kind::Int(token_int_constraint_to_proto(c)),
            ConstraintKind::Str(c) => Kind::Str(token_str_constraint_to_proto(c)),
            ConstraintKind::Date(c) => Kind::Date(token_date_constraint_to_proto(c)),
            ConstraintKind::Symbol(c) => Kind::Symbol(token_symbol_constraint_to_proto(c)),
            ConstraintKind::Bytes(c) => Kind::Bytes(token_bytes_constraint_to_proto(c)),
        }),
    }
}

pub fn proto_constraint_to_token_constraint(
    input: &schema::Constraint,
) -> Result<Constraint, error::Format> {
    use schema::constraint::Kind;

    let kind = match &input.kind {
        Some(Kind::Int(c)) => ConstraintKind::Int(proto_int_constraint_to_token(c)?),
        Some(Kind::Str(c)) => ConstraintKind::Str(proto_str_constraint_to_token(c)?),
        Some(Kind::Date(c)) => ConstraintKind::Date(proto_date_constraint_to_token(c)?),
        Some(Kind::Symbol(c)) => ConstraintKind::Symbol(proto_symbol_constraint_to_token(c)?),
        Some(Kind::Bytes(c)) => ConstraintKind::Bytes(proto_bytes_constraint_to_token(c)?),
        None => {
            return Err(error::Format::DeserializationError(
                "empty constraint".to_string(),
            ))
        }
    };

    Ok(Constraint { id: input.id, kind })
}

fn token_int_constraint_to_proto(input: &IntConstraint) -> schema::IntConstraint {
    use schema::int_constraint::Op;

    schema::IntConstraint {
        op: Some(match input {
            IntConstraint::LessThan(i) => Op::LessThan(*i),
            IntConstraint::GreaterThan(i) => Op::GreaterThan(*i),
            IntConstraint::LessOrEqual(i) => Op::LessOrEqual(*i),
            IntConstraint::GreaterOrEqual(i) => Op::GreaterOrEqual(*i),
            IntConstraint::Equal(i) => Op::Equal(*i),
            IntConstraint::In(set) => Op::InSet(schema::IntSet {
                set: set.iter().cloned().collect(),
            }),
            IntConstraint::NotIn(set) => Op::NotInSet(schema::IntSet {
                set: set.iter().cloned().collect(),
            }),
        }),
    }
}

fn proto_int_constraint_to_token(
    input: &schema::IntConstraint,
) -> Result<IntConstraint, error::Format> {
    use schema::int_constraint::Op;

    match &input.op {
        Some(Op::LessThan(i)) => Ok(IntConstraint::LessThan(*i)),
        Some(Op::GreaterThan(i)) => Ok(IntConstraint::GreaterThan(*i)),
        Some(Op::LessOrEqual(i)) => Ok(IntConstraint::LessOrEqual(*i)),
        Some(Op::GreaterOrEqual(i)) => Ok(IntConstraint::GreaterOrEqual(*i)),
        Some(Op::Equal(i)) => Ok(IntConstraint::Equal(*i)),
        Some(Op::InSet(set)) => Ok(IntConstraint::In(set.set.iter().cloned().collect())),
        Some(Op::NotInSet(set)) => Ok(IntConstraint::NotIn(set.set.iter().cloned().collect())),
        None => Err(error::Format::DeserializationError(
            "empty integer constraint".to_string(),
        )),
    }
}

fn token_str_constraint_to_proto(input: &StrConstraint) -> schema::StringConstraint {
    use schema::string_constraint::Op;

    schema::StringConstraint {
        op: Some(match input {
            StrConstraint::Prefix(s) => Op::Prefix(s.clone()),
            StrConstraint::Suffix(s) => Op::Suffix(s.clone()),
            StrConstraint::Equal(s) => Op::Equal(s.clone()),
            StrConstraint::Regex(s) => Op::Regex(s.clone()),
            StrConstraint::In(set) => Op::InSet(schema::StringSet {
                set: set.iter().cloned().collect(),
            }),
            StrConstraint::NotIn(set) => Op::NotInSet(schema::StringSet {
                set: set.iter().cloned().collect(),
            }),
        }),
    }
}

fn proto_str_constraint_to_token(
    input: &schema::StringConstraint,
) -> Result<StrConstraint, error::Format> {
    use schema::string_constraint::Op;

    match &input.op {
        Some(Op::Prefix(s)) => Ok(StrConstraint::Prefix(s.clone())),
        Some(Op::Suffix(s)) => Ok(StrConstraint::Suffix(s.clone())),
        Some(Op::Equal(s)) => Ok(StrConstraint::Equal(s.clone())),
        Some(Op::Regex(s)) => Ok(StrConstraint::Regex(s.clone())),
        Some(Op::InSet(set)) => Ok(StrConstraint::In(set.set.iter().cloned().collect())),
        Some(Op::NotInSet(set)) => Ok(StrConstraint::NotIn(set.set.iter().cloned().collect())),
        None => Err(error::Format::DeserializationError(
            "empty string constraint".to_string(),
        )),
    }
}

fn token_date_constraint_to_proto(input: &DateConstraint) -> schema::DateConstraint {
    use schema::date_constraint::Op;

    schema::DateConstraint {
        op: Some(match input {
            DateConstraint::Before(d) => Op::Before(*d),
            DateConstraint::After(d) => Op::After(*d),
        }),
    }
}

fn proto_date_constraint_to_token(
    input: &schema::DateConstraint,
) -> Result<DateConstraint, error::Format> {
    use schema::date_constraint::Op;

    match &input.op {
        Some(Op::Before(d)) => Ok(DateConstraint::Before(*d)),
        Some(Op::After(d)) => Ok(DateConstraint::After(*d)),
        None => Err(error::Format::DeserializationError(
            "empty date constraint".to_string(),
        )),
    }
}

fn token_symbol_constraint_to_proto(input: &SymbolConstraint) -> schema::SymbolConstraint {
    use schema::symbol_constraint::Op;

    schema::SymbolConstraint {
        op: Some(match input {
            SymbolConstraint::In(set) => Op::InSet(schema::SymbolSet {
                set: set.iter().cloned().collect(),
            }),
            SymbolConstraint::NotIn(set) => Op::NotInSet(schema::SymbolSet {
                set: set.iter().cloned().collect(),
            }),
        }),
    }
}

fn proto_symbol_constraint_to_token(
    input: &schema::SymbolConstraint,
) -> Result<SymbolConstraint, error::Format> {
    use schema::symbol_constraint::Op;

    match &input.op {
        Some(Op::InSet(set)) => Ok(SymbolConstraint::In(set.set.iter().cloned().collect())),
        Some(Op::NotInSet(set)) => Ok(SymbolConstraint::NotIn(set.set.iter().cloned().collect())),
        None => Err(error::Format::DeserializationError(
            "empty symbol constraint".to_string(),
        )),
    }
}

fn token_bytes_constraint_to_proto(input: &BytesConstraint) -> schema::BytesConstraint {
    use schema::bytes_constraint::Op;

    schema::BytesConstraint {
        op: Some(match input {
            BytesConstraint::Equal(b) => Op::Equal(b.clone()),
            BytesConstraint::In(set) => Op::InSet(schema::BytesSet {
                set: set.iter().cloned().collect(),
            }),
            BytesConstraint::NotIn(set) => Op::NotInSet(schema::BytesSet {
                set: set.iter().cloned().collect(),
            }),
        }),
    }
}

fn proto_bytes_constraint_to_token(
    input: &schema::BytesConstraint,
) -> Result<BytesConstraint, error::Format> {
    use schema::bytes_constraint::Op;

    match &input.op {
        Some(Op::Equal(b)) => Ok(BytesConstraint::Equal(b.clone())),
        Some(Op::InSet(set)) => Ok(BytesConstraint::In(set.set.iter().cloned().collect())),
        Some(Op::NotInSet(set)) => Ok(BytesConstraint::NotIn(set.set.iter().cloned().collect())),
        None => Err(error::Format::DeserializationError(
            "empty bytes constraint".to_string(),
        )),
    }
}
