/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! typed constraints on rule variables
use super::symbol::{print_date, SymbolTable};
use super::Term;
use regex::Regex;
use std::collections::HashSet;

/// restricts the values a rule variable can take
///
/// all of a rule's constraints must hold for a binding to be kept
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: u32,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    Int(IntConstraint),
    Str(StrConstraint),
    Date(DateConstraint),
    Symbol(SymbolConstraint),
    Bytes(BytesConstraint),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntConstraint {
    LessThan(i64),
    GreaterThan(i64),
    LessOrEqual(i64),
    GreaterOrEqual(i64),
    Equal(i64),
    In(HashSet<i64>),
    NotIn(HashSet<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrConstraint {
    Prefix(String),
    Suffix(String),
    Equal(String),
    /// unanchored: the pattern can match anywhere in the string
    Regex(String),
    In(HashSet<String>),
    NotIn(HashSet<String>),
}

/// both bounds are strict: a date equal to the boundary fails the constraint
#[derive(Debug, Clone, PartialEq)]
pub enum DateConstraint {
    Before(u64),
    After(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolConstraint {
    In(HashSet<u64>),
    NotIn(HashSet<u64>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BytesConstraint {
    Equal(Vec<u8>),
    In(HashSet<Vec<u8>>),
    NotIn(HashSet<Vec<u8>>),
}

impl Constraint {
    /// tests a candidate binding of `variable` to `term`
    ///
    /// a constraint on another variable always holds; a constraint whose
    /// kind does not match the term's type never does, so constraints act
    /// as a filter instead of raising type errors
    pub fn check(&self, variable: u32, term: &Term) -> bool {
        if self.id != variable {
            return true;
        }

        match (term, &self.kind) {
            (Term::Integer(i), ConstraintKind::Int(c)) => match c {
                IntConstraint::LessThan(j) => i < j,
                IntConstraint::GreaterThan(j) => i > j,
                IntConstraint::LessOrEqual(j) => i <= j,
                IntConstraint::GreaterOrEqual(j) => i >= j,
                IntConstraint::Equal(j) => i == j,
                IntConstraint::In(h) => h.contains(i),
                IntConstraint::NotIn(h) => !h.contains(i),
            },
            (Term::Str(s), ConstraintKind::Str(c)) => match c {
                StrConstraint::Prefix(pref) => s.starts_with(pref.as_str()),
                StrConstraint::Suffix(suff) => s.ends_with(suff.as_str()),
                StrConstraint::Equal(s2) => s == s2,
                StrConstraint::Regex(r) => match Regex::new(r) {
                    Ok(re) => re.is_match(s),
                    // an invalid regex never matches
                    Err(_) => false,
                },
                StrConstraint::In(h) => h.contains(s),
                StrConstraint::NotIn(h) => !h.contains(s),
            },
            (Term::Date(d), ConstraintKind::Date(c)) => match c {
                DateConstraint::Before(limit) => d < limit,
                DateConstraint::After(limit) => d > limit,
            },
            (Term::Symbol(s), ConstraintKind::Symbol(c)) => match c {
                SymbolConstraint::In(h) => h.contains(s),
                SymbolConstraint::NotIn(h) => !h.contains(s),
            },
            (Term::Bytes(b), ConstraintKind::Bytes(c)) => match c {
                BytesConstraint::Equal(b2) => b == b2,
                BytesConstraint::In(h) => h.contains(b),
                BytesConstraint::NotIn(h) => !h.contains(b),
            },
            _ => false,
        }
    }

    pub fn print(&self, symbols: &SymbolTable) -> String {
        let var = format!("${}", symbols.print_symbol(self.id as u64));

        match &self.kind {
            ConstraintKind::Int(IntConstraint::LessThan(i)) => format!("{} < {}", var, i),
            ConstraintKind::Int(IntConstraint::GreaterThan(i)) => format!("{} > {}", var, i),
            ConstraintKind::Int(IntConstraint::LessOrEqual(i)) => format!("{} <= {}", var, i),
            ConstraintKind::Int(IntConstraint::GreaterOrEqual(i)) => format!("{} >= {}", var, i),
            ConstraintKind::Int(IntConstraint::Equal(i)) => format!("{} == {}", var, i),
            ConstraintKind::Int(IntConstraint::In(h)) => format!("{} in {:?}", var, h),
            ConstraintKind::Int(IntConstraint::NotIn(h)) => format!("{} not in {:?}", var, h),
            ConstraintKind::Str(StrConstraint::Prefix(s)) => {
                format!("{} starts_with \"{}\"", var, s)
            }
            ConstraintKind::Str(StrConstraint::Suffix(s)) => format!("{} ends_with \"{}\"", var, s),
            ConstraintKind::Str(StrConstraint::Equal(s)) => format!("{} == \"{}\"", var, s),
            ConstraintKind::Str(StrConstraint::Regex(r)) => format!("{} matches /{}/", var, r),
            ConstraintKind::Str(StrConstraint::In(h)) => format!("{} in {:?}", var, h),
            ConstraintKind::Str(StrConstraint::NotIn(h)) => format!("{} not in {:?}", var, h),
            ConstraintKind::Date(DateConstraint::Before(d)) => {
                format!("{} < {}", var, print_date(*d))
            }
            ConstraintKind::Date(DateConstraint::After(d)) => {
                format!("{} > {}", var, print_date(*d))
            }
            ConstraintKind::Symbol(SymbolConstraint::In(h)) => {
                let set = h
                    .iter()
                    .map(|s| format!("#{}", symbols.print_symbol(*s)))
                    .collect::<Vec<_>>();
                format!("{} in {:?}", var, set)
            }
            ConstraintKind::Symbol(SymbolConstraint::NotIn(h)) => {
                let set = h
                    .iter()
                    .map(|s| format!("#{}", symbols.print_symbol(*s)))
                    .collect::<Vec<_>>();
                format!("{} not in {:?}", var, set)
            }
            ConstraintKind::Bytes(BytesConstraint::Equal(b)) => {
                format!("{} == hex:{}", var, hex::encode(b))
            }
            ConstraintKind::Bytes(BytesConstraint::In(h)) => {
                let set = h
                    .iter()
                    .map(|b| format!("hex:{}", hex::encode(b)))
                    .collect::<Vec<_>>();
                format!("{} in {:?}", var, set)
            }
            ConstraintKind::Bytes(BytesConstraint::NotIn(h)) => {
                let set = h
                    .iter()
                    .map(|b| format!("hex:{}", hex::encode(b)))
                    .collect::<Vec<_>>();
                format!("{} not in {:?}", var, set)
            }
        }
    }
}

impl AsRef<Constraint> for Constraint {
    fn as_ref(&self) -> &Constraint {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraints_filter_on_type() {
        let c = Constraint {
            id: 0,
            kind: ConstraintKind::Int(IntConstraint::GreaterOrEqual(0)),
        };

        assert!(c.check(0, &Term::Integer(12)));
        // a mismatched type is a failed match, not an error
        assert!(!c.check(0, &Term::Str("12".to_string())));
        assert!(!c.check(0, &Term::Variable(0)));
        // constraints on other variables do not apply
        assert!(c.check(1, &Term::Str("12".to_string())));
    }

    #[test]
    fn date_bounds_are_strict() {
        let before = Constraint {
            id: 0,
            kind: ConstraintKind::Date(DateConstraint::Before(100)),
        };
        let after = Constraint {
            id: 0,
            kind: ConstraintKind::Date(DateConstraint::After(100)),
        };

        assert!(before.check(0, &Term::Date(99)));
        assert!(!before.check(0, &Term::Date(100)));
        assert!(!before.check(0, &Term::Date(101)));

        assert!(!after.check(0, &Term::Date(99)));
        assert!(!after.check(0, &Term::Date(100)));
        assert!(after.check(0, &Term::Date(101)));
    }

    #[test]
    fn regex_is_unanchored() {
        let c = Constraint {
            id: 0,
            kind: ConstraintKind::Str(StrConstraint::Regex("file[0-9]+".to_string())),
        };

        assert!(c.check(0, &Term::Str("file1".to_string())));
        assert!(c.check(0, &Term::Str("/dir/file1.txt".to_string())));
        assert!(!c.check(0, &Term::Str("file".to_string())));

        let invalid = Constraint {
            id: 0,
            kind: ConstraintKind::Str(StrConstraint::Regex("(".to_string())),
        };
        assert!(!invalid.check(0, &Term::Str("anything".to_string())));
    }
}
