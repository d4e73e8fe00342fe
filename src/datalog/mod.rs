/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! Logic language implementation for caveats
//!
//! The engine evaluates a restricted Datalog dialect: facts are ground
//! predicates over interned symbols, rules derive new facts by unifying
//! their body against the fact set, and saturation runs rules to a fixed
//! point under configurable budgets.
use crate::error;
use std::collections::{HashMap, HashSet};

mod constraints;
mod symbol;
pub use constraints::*;
pub(crate) use symbol::print_date;
pub use symbol::*;

/// a tagged Datalog value
///
/// variables are only valid inside rules; facts are always ground
#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub enum Term {
    Symbol(Symbol),
    Variable(u32),
    Integer(i64),
    Str(String),
    Date(u64),
    Bytes(Vec<u8>),
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

#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub struct Predicate {
    pub name: Symbol,
    pub terms: Vec<Term>,
}

impl Predicate {
    pub fn new(name: Symbol, terms: &[Term]) -> Predicate {
        Predicate {
            name,
            terms: terms.to_vec(),
        }
    }
}

impl AsRef<Predicate> for Predicate {
    fn as_ref(&self) -> &Predicate {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub struct Fact {
    pub predicate: Predicate,
}

impl Fact {
    pub fn new(name: Symbol, terms: &[Term]) -> Fact {
        Fact {
            predicate: Predicate::new(name, terms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub head: Predicate,
    pub body: Vec<Predicate>,
    pub constraints: Vec<Constraint>,
}

/// a disjunction of queries: the caveat holds if at least one of them
/// produces a fact
#[derive(Debug, Clone, PartialEq)]
pub struct Caveat {
    pub queries: Vec<Rule>,
}

impl Rule {
    /// derives this rule's head for every binding of the body over `facts`
    pub fn apply(&self, facts: &HashSet<Fact>, new_facts: &mut Vec<Fact>) {
        let variables = MatchedVariables::new(
            self.body
                .iter()
                .flat_map(|p| {
                    p.terms.iter().filter_map(|term| match term {
                        Term::Variable(v) => Some(*v),
                        _ => None,
                    })
                })
                .collect(),
        );

        if self.body.is_empty() {
            // a rule without a body can only have a ground head
            if let Some(binding) = variables.complete() {
                if let Some(predicate) = self.instantiate_head(&binding) {
                    new_facts.push(Fact { predicate });
                }
            }
            return;
        }

        let combinator = Combinator::new(variables, &self.body, &self.constraints, facts);

        new_facts.extend(combinator.filter_map(|binding| {
            self.instantiate_head(&binding)
                .map(|predicate| Fact { predicate })
        }));
    }

    /// returns `None` for rules that are not range restricted: a head
    /// variable without a binding cannot produce a ground fact
    fn instantiate_head(&self, binding: &HashMap<u32, Term>) -> Option<Predicate> {
        let mut head = self.head.clone();
        for term in head.terms.iter_mut() {
            if let Term::Variable(v) = term {
                match binding.get(v) {
                    Some(value) => *term = value.clone(),
                    None => return None,
                }
            }
        }
        Some(head)
    }
}

/// tests whether a ground predicate can unify with a body pattern,
/// ignoring variable positions
fn match_preds(fact: &Predicate, pattern: &Predicate) -> bool {
    fact.name == pattern.name
        && fact.terms.len() == pattern.terms.len()
        && fact
            .terms
            .iter()
            .zip(&pattern.terms)
            .all(|(fact_term, pattern_term)| match pattern_term {
                Term::Variable(_) => true,
                term => fact_term == term,
            })
}

/// the set of variables a rule body must bind, with their current values
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedVariables(HashMap<u32, Option<Term>>);

impl MatchedVariables {
    pub fn new(variables: HashSet<u32>) -> Self {
        MatchedVariables(variables.iter().map(|v| (*v, None)).collect())
    }

    /// binds a variable, or checks consistency if it is already bound
    pub fn insert(&mut self, variable: u32, value: &Term) -> bool {
        match self.0.get(&variable) {
            Some(None) => {
                self.0.insert(variable, Some(value.clone()));
                true
            }
            Some(Some(bound)) => bound == value,
            None => false,
        }
    }

    pub fn complete(&self) -> Option<HashMap<u32, Term>> {
        if self.0.values().any(|v| v.is_none()) {
            return None;
        }

        Some(
            self.0
                .iter()
                .filter_map(|(k, v)| v.as_ref().map(|term| (*k, term.clone())))
                .collect(),
        )
    }
}

/// lazily produces the complete bindings for which a rule body matches
/// the fact set, scanning body predicates left to right
struct Combinator<'a> {
    bindings: MatchedVariables,
    body: &'a [Predicate],
    constraints: &'a [Constraint],
    facts: &'a HashSet<Fact>,
    candidates: std::collections::hash_set::Iter<'a, Fact>,
    rest: Option<Box<Combinator<'a>>>,
}

impl<'a> Combinator<'a> {
    fn new(
        bindings: MatchedVariables,
        body: &'a [Predicate],
        constraints: &'a [Constraint],
        facts: &'a HashSet<Fact>,
    ) -> Self {
        Combinator {
            bindings,
            body,
            constraints,
            facts,
            candidates: facts.iter(),
            rest: None,
        }
    }

    /// unifies the first body predicate with a fact, extending the current
    /// bindings and filtering through the constraints
    fn unify(&self, fact: &Fact) -> Option<MatchedVariables> {
        let pattern = &self.body[0];
        if !match_preds(&fact.predicate, pattern) {
            return None;
        }

        let mut bindings = self.bindings.clone();
        for (pattern_term, fact_term) in pattern.terms.iter().zip(&fact.predicate.terms) {
            if let Term::Variable(v) = pattern_term {
                if self.constraints.iter().any(|c| !c.check(*v, fact_term)) {
                    return None;
                }
                if !bindings.insert(*v, fact_term) {
                    return None;
                }
            }
        }

        Some(bindings)
    }
}

impl<'a> Iterator for Combinator<'a> {
    type Item = HashMap<u32, Term>;

    fn next(&mut self) -> Option<HashMap<u32, Term>> {
        loop {
            if let Some(inner) = self.rest.as_mut() {
                if let Some(binding) = inner.next() {
                    return Some(binding);
                }
                self.rest = None;
            }

            let fact = self.candidates.next()?;
            if let Some(bindings) = self.unify(fact) {
                if self.body.len() == 1 {
                    if let Some(complete) = bindings.complete() {
                        return Some(complete);
                    }
                } else {
                    self.rest = Some(Box::new(Combinator::new(
                        bindings,
                        &self.body[1..],
                        self.constraints,
                        self.facts,
                    )));
                }
            }
        }
    }
}

/// evaluation budgets for [`World::run_with_limits`]
///
/// the Herbrand universe is finite so saturation always terminates, but
/// adversarial tokens can still make it expensive; both limits fail
/// deterministically with a [`error::RunLimit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    pub max_facts: u32,
    pub max_iterations: u32,
}

impl Default for RunLimits {
    fn default() -> Self {
        RunLimits {
            max_facts: 1000,
            max_iterations: 100,
        }
    }
}

/// the mutable working state of the engine: a fact set and a rule list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct World {
    pub facts: HashSet<Fact>,
    pub rules: Vec<Rule>,
}

impl World {
    pub fn new() -> Self {
        World::default()
    }

    pub fn add_fact(&mut self, fact: Fact) {
        self.facts.insert(fact);
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// naive bottom-up saturation with the default budgets
    ///
    /// running an already saturated world derives nothing and is harmless
    pub fn run(&mut self) -> Result<(), error::RunLimit> {
        self.run_with_limits(RunLimits::default())
    }

    pub fn run_with_limits(&mut self, limits: RunLimits) -> Result<(), error::RunLimit> {
        let mut iterations = 0;

        loop {
            let mut new_facts: Vec<Fact> = Vec::new();
            for rule in self.rules.iter() {
                rule.apply(&self.facts, &mut new_facts);
            }

            let len = self.facts.len();
            self.facts.extend(new_facts.drain(..));
            if self.facts.len() == len {
                return Ok(());
            }

            if self.facts.len() > limits.max_facts as usize {
                return Err(error::RunLimit::TooManyFacts);
            }

            iterations += 1;
            if iterations == limits.max_iterations {
                return Err(error::RunLimit::TooManyIterations);
            }
        }
    }

    /// returns the facts matching a predicate pattern
    pub fn query(&self, pattern: Predicate) -> Vec<&Fact> {
        self.facts
            .iter()
            .filter(|f| match_preds(&f.predicate, &pattern))
            .collect()
    }

    /// runs a rule's body against the current facts without adding the
    /// rule to the world, returning the head instantiations
    pub fn query_rule(&self, rule: Rule) -> Vec<Fact> {
        let mut new_facts = Vec::new();
        rule.apply(&self.facts, &mut new_facts);
        new_facts
    }
}

pub fn fact<T: AsRef<Term>>(name: Symbol, terms: &[T]) -> Fact {
    Fact {
        predicate: pred(name, terms),
    }
}

pub fn pred<T: AsRef<Term>>(name: Symbol, terms: &[T]) -> Predicate {
    Predicate {
        name,
        terms: terms.iter().map(|term| term.as_ref().clone()).collect(),
    }
}

pub fn rule<T: AsRef<Term>, P: AsRef<Predicate>>(
    head_name: Symbol,
    head_terms: &[T],
    body: &[P],
) -> Rule {
    Rule {
        head: pred(head_name, head_terms),
        body: body.iter().map(|p| p.as_ref().clone()).collect(),
        constraints: Vec::new(),
    }
}

pub fn constrained_rule<T: AsRef<Term>, P: AsRef<Predicate>, C: AsRef<Constraint>>(
    head_name: Symbol,
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

pub fn int(i: i64) -> Term {
    Term::Integer(i)
}

pub fn string(s: &str) -> Term {
    Term::Str(s.to_string())
}

pub fn date(secs: u64) -> Term {
    Term::Date(secs)
}

pub fn var(symbols: &mut SymbolTable, name: &str) -> Term {
    Term::Variable(symbols.insert(name) as u32)
}

pub fn sym(symbols: &mut SymbolTable, name: &str) -> Term {
    symbols.add(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let a = syms.add("A");
        let b = syms.add("B");
        let c = syms.add("C");
        let d = syms.add("D");
        let parent = syms.insert("parent");
        let grandparent = syms.insert("grandparent");

        w.add_fact(fact(parent, &[&a, &b]));
        w.add_fact(fact(parent, &[&b, &c]));
        w.add_fact(fact(parent, &[&c, &d]));

        let grandparent_rule = || {
            let mut syms = SymbolTable::new();
            let gp = var(&mut syms, "grandparent");
            let p = var(&mut syms, "parent");
            let gc = var(&mut syms, "grandchild");
            rule(
                grandparent,
                &[&gp, &gc],
                &[pred(parent, &[&gp, &p]), pred(parent, &[&p, &gc])],
            )
        };

        // a query does not change the world
        let res = w.query_rule(grandparent_rule());
        assert_eq!(res.len(), 2);
        assert_eq!(w.facts.len(), 3);

        w.add_rule(grandparent_rule());
        w.run().unwrap();

        let e = syms.add("E");
        w.add_fact(fact(parent, &[&c, &e]));
        w.run().unwrap();

        let mut syms2 = syms.clone();
        let res = w.query(pred(
            grandparent,
            &[var(&mut syms2, "grandparent"), var(&mut syms2, "grandchild")],
        ));
        let res = res.into_iter().cloned().collect::<HashSet<_>>();
        let expected = vec![
            fact(grandparent, &[&a, &c]),
            fact(grandparent, &[&b, &d]),
            fact(grandparent, &[&b, &e]),
        ]
        .into_iter()
        .collect::<HashSet<_>>();
        assert_eq!(res, expected);
    }

    #[test]
    fn join_with_constraint() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let abc = syms.add("abc");
        let def = syms.add("def");
        let ghi = syms.add("ghi");
        let aaa = syms.add("AAA");
        let bbb = syms.add("BBB");
        let ccc = syms.add("CCC");
        let t1 = syms.insert("t1");
        let t2 = syms.insert("t2");
        let join = syms.insert("join");

        w.add_fact(fact(t1, &[&int(0), &abc]));
        w.add_fact(fact(t1, &[&int(1), &def]));
        w.add_fact(fact(t1, &[&int(2), &ghi]));

        w.add_fact(fact(t2, &[&int(0), &aaa, &int(0)]));
        w.add_fact(fact(t2, &[&int(1), &bbb, &int(0)]));
        w.add_fact(fact(t2, &[&int(2), &ccc, &int(1)]));

        let id = var(&mut syms, "id");
        let left = var(&mut syms, "left");
        let right = var(&mut syms, "right");
        let t2_id = var(&mut syms, "t2_id");

        let res = w.query_rule(rule(
            join,
            &[&left, &right],
            &[
                pred(t1, &[&id, &left]),
                pred(t2, &[&t2_id, &right, &id]),
            ],
        ));

        let res = res.into_iter().collect::<HashSet<_>>();
        let expected = vec![
            fact(join, &[&abc, &aaa]),
            fact(join, &[&abc, &bbb]),
            fact(join, &[&def, &ccc]),
        ]
        .into_iter()
        .collect::<HashSet<_>>();
        assert_eq!(res, expected);

        // the same join, keeping only ids lower than 1
        let id_sym = syms.insert("id") as u32;
        let res = w.query_rule(constrained_rule(
            join,
            &[&left, &right],
            &[
                pred(t1, &[&id, &left]),
                pred(t2, &[&t2_id, &right, &id]),
            ],
            &[Constraint {
                id: id_sym,
                kind: ConstraintKind::Int(IntConstraint::LessThan(1)),
            }],
        ));

        let res = res.into_iter().collect::<HashSet<_>>();
        let expected = vec![fact(join, &[&abc, &aaa]), fact(join, &[&abc, &bbb])]
            .into_iter()
            .collect::<HashSet<_>>();
        assert_eq!(res, expected);
    }

    #[test]
    fn string_suffix() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let app_0 = syms.add("app_0");
        let app_1 = syms.add("app_1");
        let app_2 = syms.add("app_2");
        let route = syms.insert("route");
        let suff = syms.insert("route suffix");

        w.add_fact(fact(route, &[&int(0), &app_0, &string("example.com")]));
        w.add_fact(fact(route, &[&int(1), &app_1, &string("test.com")]));
        w.add_fact(fact(route, &[&int(2), &app_2, &string("test.fr")]));
        w.add_fact(fact(route, &[&int(3), &app_0, &string("www.example.com")]));

        let route_id = var(&mut syms, "route_id");
        let app_id = var(&mut syms, "app_id");
        let domain = var(&mut syms, "domain_name");
        let domain_sym = syms.insert("domain_name") as u32;

        let test_suffix = |suffix: &str| {
            w.query_rule(constrained_rule(
                suff,
                &[&app_id, &domain],
                &[pred(route, &[&route_id, &app_id, &domain])],
                &[Constraint {
                    id: domain_sym,
                    kind: ConstraintKind::Str(StrConstraint::Suffix(suffix.to_string())),
                }],
            ))
        };

        let res = test_suffix(".fr").into_iter().collect::<HashSet<_>>();
        let expected = vec![fact(suff, &[&app_2, &string("test.fr")])]
            .into_iter()
            .collect::<HashSet<_>>();
        assert_eq!(res, expected);

        let res = test_suffix("example.com").into_iter().collect::<HashSet<_>>();
        let expected = vec![
            fact(suff, &[&app_0, &string("example.com")]),
            fact(suff, &[&app_0, &string("www.example.com")]),
        ]
        .into_iter()
        .collect::<HashSet<_>>();
        assert_eq!(res, expected);
    }

    #[test]
    fn date_constraint() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let t1 = 1_000u64;
        let t2 = t1 + 10;
        let t3 = t2 + 30;

        let abc = syms.add("abc");
        let def = syms.add("def");
        let x = syms.insert("x");
        let before = syms.insert("before");
        let after = syms.insert("after");

        w.add_fact(fact(x, &[&date(t1), &abc]));
        w.add_fact(fact(x, &[&date(t2), &def]));
        w.add_fact(fact(x, &[&date(t3), &def]));

        let d = var(&mut syms, "date");
        let val = var(&mut syms, "val");
        let date_sym = syms.insert("date") as u32;

        // the bound is strict: x(t2, def) matches neither query
        let res = w.query_rule(constrained_rule(
            before,
            &[&d, &val],
            &[pred(x, &[&d, &val])],
            &[Constraint {
                id: date_sym,
                kind: ConstraintKind::Date(DateConstraint::Before(t2)),
            }],
        ));
        assert_eq!(res, vec![fact(before, &[&date(t1), &abc])]);

        let res = w.query_rule(constrained_rule(
            after,
            &[&d, &val],
            &[pred(x, &[&d, &val])],
            &[Constraint {
                id: date_sym,
                kind: ConstraintKind::Date(DateConstraint::After(t2)),
            }],
        ));
        assert_eq!(res, vec![fact(after, &[&date(t3), &def])]);
    }

    #[test]
    fn set_constraint() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let abc = syms.add("abc");
        let def = syms.add("def");
        let x = syms.insert("x");
        let int_set = syms.insert("int_set");
        let symbol_set = syms.insert("symbol_set");

        w.add_fact(fact(x, &[&abc, &int(0), &string("test")]));
        w.add_fact(fact(x, &[&def, &int(2), &string("hello")]));

        let s = var(&mut syms, "sym");
        let i = var(&mut syms, "int");
        let st = var(&mut syms, "str");
        let int_sym = syms.insert("int") as u32;
        let sym_sym = syms.insert("sym") as u32;

        let res = w.query_rule(constrained_rule(
            int_set,
            &[&s, &st],
            &[pred(x, &[&s, &i, &st])],
            &[Constraint {
                id: int_sym,
                kind: ConstraintKind::Int(IntConstraint::In([0, 1].iter().cloned().collect())),
            }],
        ));
        assert_eq!(res, vec![fact(int_set, &[&abc, &string("test")])]);

        let abc_id = syms.insert("abc");
        let res = w.query_rule(constrained_rule(
            symbol_set,
            &[&s, &st],
            &[pred(x, &[&s, &i, &st])],
            &[Constraint {
                id: sym_sym,
                kind: ConstraintKind::Symbol(SymbolConstraint::NotIn(
                    [abc_id].iter().cloned().collect(),
                )),
            }],
        ));
        assert_eq!(res, vec![fact(symbol_set, &[&def, &string("hello")])]);
    }

    #[test]
    fn iteration_limit() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let a = syms.insert("a");
        let b = syms.insert("b");
        let c = syms.insert("c");

        w.add_fact(fact(a, &[&int(0)]));
        let v = var(&mut syms, "v");
        w.add_rule(rule(b, &[&v], &[pred(a, &[&v])]));
        w.add_rule(rule(c, &[&v], &[pred(b, &[&v])]));

        let res = w.clone().run_with_limits(RunLimits {
            max_facts: 1000,
            max_iterations: 1,
        });
        assert_eq!(res, Err(error::RunLimit::TooManyIterations));

        assert_eq!(
            w.run_with_limits(RunLimits {
                max_facts: 1000,
                max_iterations: 10,
            }),
            Ok(())
        );
        assert_eq!(w.facts.len(), 3);
    }

    #[test]
    fn fact_limit() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let a = syms.insert("a");
        let b = syms.insert("b");

        for i in 0..10 {
            w.add_fact(fact(a, &[&int(i)]));
        }
        let v = var(&mut syms, "v");
        w.add_rule(rule(b, &[&v], &[pred(a, &[&v])]));

        let res = w.clone().run_with_limits(RunLimits {
            max_facts: 15,
            max_iterations: 100,
        });
        assert_eq!(res, Err(error::RunLimit::TooManyFacts));

        assert_eq!(
            w.run_with_limits(RunLimits {
                max_facts: 20,
                max_iterations: 100,
            }),
            Ok(())
        );
    }

    #[test]
    fn saturation_is_a_fixed_point() {
        let mut w = World::new();
        let mut syms = SymbolTable::new();

        let parent = syms.insert("parent");
        let ancestor = syms.insert("ancestor");
        let a = syms.add("A");
        let b = syms.add("B");
        let c = syms.add("C");

        w.add_fact(fact(parent, &[&a, &b]));
        w.add_fact(fact(parent, &[&b, &c]));

        let x = var(&mut syms, "x");
        let y = var(&mut syms, "y");
        let z = var(&mut syms, "z");
        w.add_rule(rule(ancestor, &[&x, &y], &[pred(parent, &[&x, &y])]));
        w.add_rule(rule(
            ancestor,
            &[&x, &z],
            &[pred(ancestor, &[&x, &y]), pred(ancestor, &[&y, &z])],
        ));

        w.run().unwrap();
        let saturated = w.facts.clone();

        // one more pass must not derive anything new
        w.run().unwrap();
        assert_eq!(w.facts, saturated);

        // derived facts are all ground
        let has_variable = w.facts.iter().any(|f| {
            f.predicate
                .terms
                .iter()
                .any(|term| matches!(term, Term::Variable(_)))
        });
        assert!(!has_variable);
    }
}
