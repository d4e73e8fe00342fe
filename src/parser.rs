/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! Datalog text format parsing
//!
//! all of the parsers are usable with [`TryFrom`] so they can be used
//! as follows:
//!
//! ```rust
//! use std::convert::TryInto;
//! use biscuit::builder::Fact;
//!
//! let f: Fact = "test(#data)".try_into().expect("parse error");
//! ```
//!
//! All of the methods in [BiscuitBuilder](`crate::builder::BiscuitBuilder`)
//! and [BlockBuilder](`crate::builder::BlockBuilder`) can take strings
//! as arguments too
use crate::error;
use crate::token::builder::{
    self, BytesConstraint, Constraint, ConstraintKind, DateConstraint, IntConstraint,
    StrConstraint, SymbolConstraint,
};
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while1},
    character::complete::{char, digit1, multispace0 as space0, multispace1 as space1},
    combinator::{map, map_opt, map_res, opt, recognize, value},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use std::collections::HashSet;
use std::convert::{TryFrom, TryInto};
use std::str::FromStr;
use std::time::{Duration, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// parse a Datalog fact
pub fn fact(i: &str) -> IResult<&str, builder::Fact> {
    map(predicate, builder::Fact)(i)
}

/// parse a Datalog rule: `head(...) <- body(...), ... @ constraints`
pub fn rule(i: &str) -> IResult<&str, builder::Rule> {
    let (i, head) = rule_head(i)?;
    let (i, _) = space0(i)?;
    let (i, _) = tag("<-")(i)?;

    let (i, body) = separated_list1(
        preceded(space0, char(',')),
        preceded(space0, predicate),
    )(i)?;

    let (i, constraints) = opt(preceded(
        preceded(space0, char('@')),
        separated_list1(preceded(space0, char(',')), constraint),
    ))(i)?;

    Ok((
        i,
        builder::Rule {
            head,
            body,
            constraints: constraints.unwrap_or_default(),
        },
    ))
}

/// parse a Datalog caveat: queries separated by `||`
pub fn caveat(i: &str) -> IResult<&str, builder::Caveat> {
    map(
        separated_list1(preceded(space0, tag("||")), preceded(space0, rule)),
        |queries| builder::Caveat { queries },
    )(i)
}

pub fn predicate(i: &str) -> IResult<&str, builder::Predicate> {
    let (i, _) = space0(i)?;
    let (i, name) = name(i)?;
    let (i, _) = space0(i)?;
    let (i, terms) = delimited(
        char('('),
        separated_list1(preceded(space0, char(',')), preceded(space0, term)),
        preceded(space0, char(')')),
    )(i)?;

    Ok((
        i,
        builder::Predicate {
            name: name.to_string(),
            terms,
        },
    ))
}

// contrary to predicates, a rule head can have no term at all
fn rule_head(i: &str) -> IResult<&str, builder::Predicate> {
    let (i, _) = space0(i)?;
    let (i, name) = name(i)?;
    let (i, _) = space0(i)?;
    let (i, terms) = delimited(
        char('('),
        opt(separated_list1(
            preceded(space0, char(',')),
            preceded(space0, term),
        )),
        preceded(space0, char(')')),
    )(i)?;

    Ok((
        i,
        builder::Predicate {
            name: name.to_string(),
            terms: terms.unwrap_or_default(),
        },
    ))
}

fn name(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(i)
}

fn term(i: &str) -> IResult<&str, builder::Term> {
    alt((
        map(symbol_name, |s| builder::Term::Symbol(s.to_string())),
        map(variable_name, |s| builder::Term::Variable(s.to_string())),
        map(string_literal, builder::Term::Str),
        map(bytes_literal, builder::Term::Bytes),
        map(date_literal, builder::Term::Date),
        map(integer_literal, builder::Term::Integer),
    ))(i)
}

fn symbol_name(i: &str) -> IResult<&str, &str> {
    preceded(char('#'), name)(i)
}

fn variable_name(i: &str) -> IResult<&str, &str> {
    preceded(char('$'), name)(i)
}

fn string_literal(i: &str) -> IResult<&str, String> {
    alt((
        value(String::new(), tag("\"\"")),
        delimited(
            char('"'),
            escaped_transform(
                take_while1(|c: char| c != '\\' && c != '"'),
                '\\',
                alt((
                    value("\\", tag("\\")),
                    value("\"", tag("\"")),
                    value("\n", tag("n")),
                )),
            ),
            char('"'),
        ),
    ))(i)
}

fn bytes_literal(i: &str) -> IResult<&str, Vec<u8>> {
    map_res(
        preceded(tag("hex:"), take_while1(|c: char| c.is_ascii_hexdigit())),
        hex::decode,
    )(i)
}

fn date_literal(i: &str) -> IResult<&str, u64> {
    map_res(
        take_while1(|c: char| {
            c.is_ascii_digit() || c == '-' || c == ':' || c == '+' || c == '.' || c == 'T' || c == 'Z'
        }),
        |s: &str| {
            OffsetDateTime::parse(s, &Rfc3339)
                .map(|date| date.unix_timestamp() as u64)
        },
    )(i)
}

fn integer_literal(i: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        i64::from_str(s)
    })(i)
}

enum Operand {
    Integer(i64),
    Str(String),
    Date(u64),
    Bytes(Vec<u8>),
}

fn operand(i: &str) -> IResult<&str, Operand> {
    alt((
        map(string_literal, Operand::Str),
        map(bytes_literal, Operand::Bytes),
        map(date_literal, Operand::Date),
        map(integer_literal, Operand::Integer),
    ))(i)
}

/// parse a variable constraint
///
/// integers support `<`, `>`, `<=`, `>=`, `==`, dates `<` and `>`
/// (strict bounds), strings `==`, `starts_with`, `ends_with` and
/// `matches`, and every type but dates `in` / `not in` sets
pub fn constraint(i: &str) -> IResult<&str, Constraint> {
    let (i, _) = space0(i)?;
    let (i, id) = variable_name(i)?;
    let (i, _) = space0(i)?;
    let (i, kind) = alt((
        comparison_constraint,
        matches_constraint,
        prefix_constraint,
        suffix_constraint,
        set_constraint,
    ))(i)?;

    Ok((
        i,
        Constraint {
            id: id.to_string(),
            kind,
        },
    ))
}

fn comparison_constraint(i: &str) -> IResult<&str, ConstraintKind> {
    let (i, op) = alt((tag("<="), tag(">="), tag("=="), tag("<"), tag(">")))(i)?;
    let (i, _) = space0(i)?;

    map_opt(operand, move |operand| match (op, operand) {
        ("<", Operand::Integer(j)) => Some(ConstraintKind::Integer(IntConstraint::LessThan(j))),
        (">", Operand::Integer(j)) => Some(ConstraintKind::Integer(IntConstraint::GreaterThan(j))),
        ("<=", Operand::Integer(j)) => {
            Some(ConstraintKind::Integer(IntConstraint::LessOrEqual(j)))
        }
        (">=", Operand::Integer(j)) => {
            Some(ConstraintKind::Integer(IntConstraint::GreaterOrEqual(j)))
        }
        ("==", Operand::Integer(j)) => Some(ConstraintKind::Integer(IntConstraint::Equal(j))),
        ("<", Operand::Date(d)) => Some(ConstraintKind::Date(DateConstraint::Before(
            UNIX_EPOCH + Duration::from_secs(d),
        ))),
        (">", Operand::Date(d)) => Some(ConstraintKind::Date(DateConstraint::After(
            UNIX_EPOCH + Duration::from_secs(d),
        ))),
        ("==", Operand::Str(s)) => Some(ConstraintKind::String(StrConstraint::Equal(s))),
        ("==", Operand::Bytes(b)) => Some(ConstraintKind::Bytes(BytesConstraint::Equal(b))),
        _ => None,
    })(i)
}

fn matches_constraint(i: &str) -> IResult<&str, ConstraintKind> {
    map(
        preceded(pair(tag("matches"), space0), string_literal),
        |regex| ConstraintKind::String(StrConstraint::Regex(regex)),
    )(i)
}

fn prefix_constraint(i: &str) -> IResult<&str, ConstraintKind> {
    map(
        preceded(pair(tag("starts_with"), space0), string_literal),
        |prefix| ConstraintKind::String(StrConstraint::Prefix(prefix)),
    )(i)
}

fn suffix_constraint(i: &str) -> IResult<&str, ConstraintKind> {
    map(
        preceded(pair(tag("ends_with"), space0), string_literal),
        |suffix| ConstraintKind::String(StrConstraint::Suffix(suffix)),
    )(i)
}

fn set_constraint(i: &str) -> IResult<&str, ConstraintKind> {
    let (i, not) = map(opt(terminated(tag("not"), space1)), |o| o.is_some())(i)?;
    let (i, _) = tag("in")(i)?;
    let (i, _) = space0(i)?;

    delimited(
        char('['),
        alt((
            map(
                separated_list1(
                    preceded(space0, char(',')),
                    preceded(space0, symbol_name),
                ),
                move |symbols| {
                    let set: HashSet<_> = symbols.iter().map(|s| s.to_string()).collect();
                    if not {
                        ConstraintKind::Symbol(SymbolConstraint::NotIn(set))
                    } else {
                        ConstraintKind::Symbol(SymbolConstraint::In(set))
                    }
                },
            ),
            map(
                separated_list1(
                    preceded(space0, char(',')),
                    preceded(space0, string_literal),
                ),
                move |strings| {
                    let set: HashSet<_> = strings.into_iter().collect();
                    if not {
                        ConstraintKind::String(StrConstraint::NotIn(set))
                    } else {
                        ConstraintKind::String(StrConstraint::In(set))
                    }
                },
            ),
            map(
                separated_list1(
                    preceded(space0, char(',')),
                    preceded(space0, bytes_literal),
                ),
                move |bytes| {
                    let set: HashSet<_> = bytes.into_iter().collect();
                    if not {
                        ConstraintKind::Bytes(BytesConstraint::NotIn(set))
                    } else {
                        ConstraintKind::Bytes(BytesConstraint::In(set))
                    }
                },
            ),
            map(
                separated_list1(
                    preceded(space0, char(',')),
                    preceded(space0, integer_literal),
                ),
                move |integers| {
                    let set: HashSet<_> = integers.into_iter().collect();
                    if not {
                        ConstraintKind::Integer(IntConstraint::NotIn(set))
                    } else {
                        ConstraintKind::Integer(IntConstraint::In(set))
                    }
                },
            ),
        )),
        preceded(space0, char(']')),
    )(i)
}

impl TryFrom<&str> for builder::Fact {
    type Error = error::Token;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        fact(value)
            .map(|(_, o)| o)
            .map_err(|_| error::Token::ParseError)
    }
}

impl TryFrom<&str> for builder::Rule {
    type Error = error::Token;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        rule(value)
            .map(|(_, o)| o)
            .map_err(|_| error::Token::ParseError)
    }
}

impl TryFrom<&str> for builder::Caveat {
    type Error = error::Token;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        caveat(value)
            .map(|(_, o)| o)
            .map_err(|_| error::Token::ParseError)
    }
}

impl FromStr for builder::Fact {
    type Err = error::Token;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.try_into()
    }
}

impl FromStr for builder::Rule {
    type Err = error::Token;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.try_into()
    }
}

impl FromStr for builder::Caveat {
    type Err = error::Token;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.try_into()
    }
}

impl FromStr for builder::Predicate {
    type Err = error::Token;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        predicate(s)
            .map(|(_, o)| o)
            .map_err(|_| error::Token::ParseError)
    }
}

#[cfg(test)]
mod tests {
    use crate::token::builder::{self, fact, int, pred, rule, s, string, var};
    use std::convert::TryInto;

    #[test]
    fn fact_grammar() {
        let parsed: builder::Fact = "right(#authority, \"file1\", #read)"
            .try_into()
            .expect("parse error");
        assert_eq!(
            parsed,
            fact("right", &[s("authority"), string("file1"), s("read")])
        );

        let parsed: builder::Fact = "count(42, -12, hex:deadbeef)"
            .try_into()
            .expect("parse error");
        assert_eq!(
            parsed,
            fact(
                "count",
                &[
                    int(42),
                    int(-12),
                    builder::Term::Bytes(vec![0xde, 0xad, 0xbe, 0xef])
                ]
            )
        );

        let parsed: builder::Fact = "expiry(#ambient, 2030-12-31T12:59:59Z)"
            .try_into()
            .expect("parse error");
        assert_eq!(
            parsed,
            fact(
                "expiry",
                &[s("ambient"), builder::Term::Date(1_924_952_399)]
            )
        );

        let escaped: builder::Fact = "data(\"quoted \\\"string\\\"\")"
            .try_into()
            .expect("parse error");
        assert_eq!(
            escaped,
            fact("data", &[string("quoted \"string\"")])
        );

        let invalid: Result<builder::Fact, _> = "right(".try_into();
        assert!(invalid.is_err());
    }

    #[test]
    fn rule_grammar() {
        let parsed: builder::Rule =
            "valid($res) <- resource(#ambient, $res), right(#authority, $res, #read)"
                .try_into()
                .expect("parse error");
        assert_eq!(
            parsed,
            rule(
                "valid",
                &[var("res")],
                &[
                    pred("resource", &[s("ambient"), var("res")]),
                    pred("right", &[s("authority"), var("res"), s("read")]),
                ]
            )
        );
    }

    #[test]
    fn constraint_grammar() {
        use builder::{Constraint, ConstraintKind, IntConstraint, StrConstraint};

        let parsed: builder::Rule = "limited($id) <- query($id) @ $id >= 10, $id not in [1, 2]"
            .try_into()
            .expect("parse error");
        assert_eq!(
            parsed.constraints,
            vec![
                Constraint {
                    id: "id".to_string(),
                    kind: ConstraintKind::Integer(IntConstraint::GreaterOrEqual(10)),
                },
                Constraint {
                    id: "id".to_string(),
                    kind: ConstraintKind::Integer(IntConstraint::NotIn(
                        [1, 2].iter().cloned().collect()
                    )),
                },
            ]
        );

        let parsed: builder::Rule =
            "prefixed($path) <- resource(#ambient, $path) @ $path starts_with \"/app/\""
                .try_into()
                .expect("parse error");
        assert_eq!(
            parsed.constraints,
            vec![Constraint {
                id: "path".to_string(),
                kind: ConstraintKind::String(StrConstraint::Prefix("/app/".to_string())),
            }]
        );

        let parsed: builder::Rule = "re($name) <- file($name) @ $name matches \"file[0-9]+\""
            .try_into()
            .expect("parse error");
        assert_eq!(
            parsed.constraints,
            vec![Constraint {
                id: "name".to_string(),
                kind: ConstraintKind::String(StrConstraint::Regex("file[0-9]+".to_string())),
            }]
        );
    }

    #[test]
    fn caveat_grammar() {
        let parsed: builder::Caveat =
            "check($0) <- resource(#ambient, $0) || check($1) <- operation(#ambient, $1)"
                .try_into()
                .expect("parse error");
        assert_eq!(parsed.queries.len(), 2);

        let single: builder::Caveat = "check($0) <- resource(#ambient, $0)"
            .try_into()
            .expect("parse error");
        assert_eq!(single.queries.len(), 1);
    }

    #[test]
    fn date_constraint_grammar() {
        use builder::{ConstraintKind, DateConstraint};
        use std::time::{Duration, UNIX_EPOCH};

        let parsed: builder::Rule =
            "expired($date) <- time(#ambient, $date) @ $date < 1970-01-01T00:16:40Z"
                .try_into()
                .expect("parse error");
        assert_eq!(
            parsed.constraints[0].kind,
            ConstraintKind::Date(DateConstraint::Before(
                UNIX_EPOCH + Duration::from_secs(1000)
            ))
        );
    }
}
