/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! interned string table
//!
//! Datalog elements never carry strings for predicate and symbol names,
//! only indexes into a table shared by the whole token. Parsing a token
//! rebuilds the table by appending each block's delta in block order, so
//! the indexes stay consistent across blocks.
use super::{Caveat, Fact, Predicate, Rule, Term};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub type Symbol = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolTable {
    pub symbols: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// returns the index of the symbol, interning it if needed
    pub fn insert(&mut self, s: &str) -> Symbol {
        match self.symbols.iter().position(|sym| sym.as_str() == s) {
            Some(index) => index as u64,
            None => {
                self.symbols.push(s.to_string());
                (self.symbols.len() - 1) as u64
            }
        }
    }

    /// interns the string and returns it as a symbol term
    pub fn add(&mut self, s: &str) -> Term {
        Term::Symbol(self.insert(s))
    }

    /// looks up a symbol without inserting it
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.symbols
            .iter()
            .position(|sym| sym.as_str() == s)
            .map(|i| i as u64)
    }

    pub fn get_symbol(&self, i: Symbol) -> Option<&str> {
        self.symbols.get(i as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// removes and returns the symbols at positions `[at..]`, keeping
    /// `[0..at]` in place
    ///
    /// the block builders use this to extract the delta a block must carry
    pub fn split_off(&mut self, at: usize) -> SymbolTable {
        SymbolTable {
            symbols: self.symbols.split_off(at),
        }
    }

    /// appends another table's symbols, used when merging block deltas
    pub fn extend(&mut self, other: &SymbolTable) {
        self.symbols.extend(other.symbols.iter().cloned())
    }

    pub fn is_disjoint(&self, other: &SymbolTable) -> bool {
        !self.symbols.iter().any(|s| other.symbols.contains(s))
    }

    pub fn print_symbol(&self, i: Symbol) -> String {
        self.get_symbol(i)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("<{}?>", i))
    }

    pub fn print_term(&self, term: &Term) -> String {
        match term {
            Term::Symbol(s) => format!("#{}", self.print_symbol(*s)),
            Term::Variable(v) => format!("${}", self.print_symbol(*v as u64)),
            Term::Integer(i) => i.to_string(),
            Term::Str(s) => format!("\"{}\"", s),
            Term::Date(d) => print_date(*d),
            Term::Bytes(b) => format!("hex:{}", hex::encode(b)),
        }
    }

    pub fn print_predicate(&self, p: &Predicate) -> String {
        let terms = p
            .terms
            .iter()
            .map(|term| self.print_term(term))
            .collect::<Vec<_>>();
        format!("{}({})", self.print_symbol(p.name), terms.join(", "))
    }

    pub fn print_fact(&self, f: &Fact) -> String {
        self.print_predicate(&f.predicate)
    }

    pub fn print_rule(&self, r: &Rule) -> String {
        let head = self.print_predicate(&r.head);
        let body = r
            .body
            .iter()
            .map(|p| self.print_predicate(p))
            .collect::<Vec<_>>();

        if r.constraints.is_empty() {
            format!("{} <- {}", head, body.join(", "))
        } else {
            let constraints = r
                .constraints
                .iter()
                .map(|c| c.print(self))
                .collect::<Vec<_>>();
            format!("{} <- {} @ {}", head, body.join(", "), constraints.join(", "))
        }
    }

    pub fn print_caveat(&self, c: &Caveat) -> String {
        let queries = c
            .queries
            .iter()
            .map(|r| self.print_rule(r))
            .collect::<Vec<_>>();
        queries.join(" || ")
    }
}

pub(crate) fn print_date(secs: u64) -> String {
    OffsetDateTime::from_unix_timestamp(secs as i64)
        .ok()
        .and_then(|date| date.format(&Rfc3339).ok())
        .unwrap_or_else(|| secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut syms = SymbolTable::new();
        let a = syms.insert("abc");
        let b = syms.insert("def");
        assert_eq!(syms.insert("abc"), a);
        assert_eq!(syms.insert("def"), b);
        assert_eq!(syms.len(), 2);
        assert_eq!(syms.get("abc"), Some(a));
        assert_eq!(syms.get("xyz"), None);
    }

    #[test]
    fn split_and_extend() {
        let mut syms = SymbolTable::new();
        syms.insert("authority");
        syms.insert("ambient");
        let base_len = syms.len();

        syms.insert("hello");
        syms.insert("world");

        let delta = syms.split_off(base_len);
        assert_eq!(syms.len(), base_len);
        assert_eq!(delta.symbols, vec!["hello".to_string(), "world".to_string()]);
        assert!(syms.is_disjoint(&delta));

        syms.extend(&delta);
        assert_eq!(syms.get("world"), Some(3));
    }

    #[test]
    fn printing() {
        let mut syms = SymbolTable::new();
        let resource = syms.insert("resource");
        let ambient = syms.insert("ambient");

        let fact = Fact::new(
            resource,
            &[Term::Symbol(ambient), Term::Str("file1".to_string())],
        );
        assert_eq!(syms.print_fact(&fact), "resource(#ambient, \"file1\")");
    }
}
