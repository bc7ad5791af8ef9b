// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{borrow::Cow, fmt};

/// Index of a decision variable in a [`VariableRegistry`](super::VariableRegistry) pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    /// An integer in `[min, max]`.
    Integer { min: i64, max: i64 },
}

impl VarKind {
    #[inline]
    pub fn bounds(self) -> (i64, i64) {
        match self {
            Self::Binary => (0, 1),
            Self::Integer { min, max } => (min, max),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
}

/// A linear combination of variables with integer coefficients.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
}

impl LinearExpr {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    /// The sum of `vars`, each with coefficient 1.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|var| (var, 1)).collect(),
        }
    }

    #[inline]
    pub fn add_term(&mut self, var: VarId, coefficient: i64) {
        self.terms.push((var, coefficient));
    }

    #[inline]
    pub fn with_term(mut self, var: VarId, coefficient: i64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    #[inline]
    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression against values indexed by [`VarId`].
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values[var.0])
            .sum()
    }

    /// Sorts terms by variable, merges repeated variables and drops zero coefficients.
    fn normalize(&mut self) {
        self.terms.sort_unstable_by_key(|&(var, _)| var);
        let mut merged: Vec<(VarId, i64)> = Vec::with_capacity(self.terms.len());
        for &(var, coefficient) in &self.terms {
            match merged.last_mut() {
                Some((last, sum)) if *last == var => *sum += coefficient,
                _ => merged.push((var, coefficient)),
            }
        }
        merged.retain(|&(_, coefficient)| coefficient != 0);
        self.terms = merged;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    #[inline]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
        }
    }

    fn lp_operator(self) -> &'static str {
        match self {
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "=",
        }
    }
}

/// `expr <sense> rhs`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    expr: LinearExpr,
    sense: Sense,
    rhs: i64,
}

impl Constraint {
    pub fn new(mut expr: LinearExpr, sense: Sense, rhs: i64) -> Self {
        expr.normalize();
        Self { expr, sense, rhs }
    }

    /// `a + b <= 1`, for two distinct variables.
    ///
    /// These make up the bulk of every program, so this skips normalization and builds the
    /// result directly. It is equal to `Constraint::new(LinearExpr::sum([a, b]), Sense::Le, 1)`.
    #[inline]
    pub fn at_most_one_of(a: VarId, b: VarId) -> Self {
        debug_assert_ne!(a, b, "at_most_one_of requires distinct variables");
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Self {
            expr: LinearExpr {
                terms: vec![(first, 1), (second, 1)],
            },
            sense: Sense::Le,
            rhs: 1,
        }
    }

    #[inline]
    pub fn expr(&self) -> &LinearExpr {
        &self.expr
    }

    #[inline]
    pub fn sense(&self) -> Sense {
        self.sense
    }

    #[inline]
    pub fn rhs(&self) -> i64 {
        self.rhs
    }

    #[inline]
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        self.sense.holds(self.expr.evaluate(values), self.rhs)
    }
}

/// A minimization program over a prefix of a variable pool.
///
/// Constraints are either borrowed from a longer-lived cache or owned by this program.
#[derive(Clone, Debug)]
pub struct IntegerProgram<'a> {
    variables: &'a [VarDef],
    constraints: Vec<Cow<'a, Constraint>>,
    objective: LinearExpr,
}

impl<'a> IntegerProgram<'a> {
    pub fn new(variables: &'a [VarDef]) -> Self {
        Self {
            variables,
            constraints: Vec::new(),
            objective: LinearExpr::new(),
        }
    }

    #[inline]
    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(Cow::Owned(constraint));
    }

    #[inline]
    pub fn push_cached(&mut self, constraint: &'a Constraint) {
        self.constraints.push(Cow::Borrowed(constraint));
    }

    #[inline]
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    #[inline]
    pub fn variables(&self) -> &'a [VarDef] {
        self.variables
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> + ExactSizeIterator + '_ {
        self.constraints.iter().map(|c| &**c)
    }

    #[inline]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// The number of constraints borrowed from a cache rather than built for this program.
    pub fn cached_constraint_count(&self) -> usize {
        self.constraints
            .iter()
            .filter(|c| matches!(c, Cow::Borrowed(_)))
            .count()
    }

    #[inline]
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Checks variable bounds and every constraint against values indexed by [`VarId`].
    pub fn is_satisfied_by(&self, values: &[i64]) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let in_bounds = self.variables.iter().zip(values).all(|(def, &value)| {
            let (min, max) = def.kind.bounds();
            (min..=max).contains(&value)
        });
        in_bounds && self.constraints().all(|c| c.is_satisfied(values))
    }

    #[inline]
    pub fn lp_display(&self) -> LpDisplay<'_, 'a> {
        LpDisplay { program: self }
    }

    fn write_expr(&self, f: &mut fmt::Formatter, expr: &LinearExpr) -> fmt::Result {
        if expr.is_empty() {
            return write!(f, " 0");
        }
        for &(var, coefficient) in expr.terms() {
            let sign = if coefficient < 0 { '-' } else { '+' };
            write!(
                f,
                " {} {} {}",
                sign,
                coefficient.abs(),
                self.variables[var.0].name
            )?;
        }
        Ok(())
    }
}

/// Writes a program in CPLEX LP format.
pub struct LpDisplay<'p, 'a> {
    program: &'p IntegerProgram<'a>,
}

impl<'p, 'a> fmt::Display for LpDisplay<'p, 'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let program = self.program;

        writeln!(f, "Minimize")?;
        write!(f, " obj:")?;
        program.write_expr(f, program.objective())?;
        writeln!(f)?;

        writeln!(f, "Subject To")?;
        for (ix, constraint) in program.constraints().enumerate() {
            write!(f, " c{}:", ix)?;
            program.write_expr(f, constraint.expr())?;
            writeln!(
                f,
                " {} {}",
                constraint.sense().lp_operator(),
                constraint.rhs()
            )?;
        }

        writeln!(f, "Bounds")?;
        for def in program.variables() {
            if let VarKind::Integer { min, max } = def.kind {
                writeln!(f, " {} <= {} <= {}", min, def.name, max)?;
            }
        }

        writeln!(f, "Binaries")?;
        for def in program.variables() {
            if def.kind == VarKind::Binary {
                writeln!(f, " {}", def.name)?;
            }
        }

        writeln!(f, "Generals")?;
        for def in program.variables() {
            if matches!(def.kind, VarKind::Integer { .. }) {
                writeln!(f, " {}", def.name)?;
            }
        }

        writeln!(f, "End")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Vec<VarDef> {
        vec![
            VarDef {
                name: "x".to_owned(),
                kind: VarKind::Binary,
            },
            VarDef {
                name: "y".to_owned(),
                kind: VarKind::Binary,
            },
            VarDef {
                name: "n".to_owned(),
                kind: VarKind::Integer { min: 0, max: 2 },
            },
        ]
    }

    #[test]
    fn test_at_most_one_of_matches_generic() {
        let a = VarId(3);
        let b = VarId(1);
        assert_eq!(
            Constraint::at_most_one_of(a, b),
            Constraint::new(LinearExpr::sum([a, b]), Sense::Le, 1),
        );
        assert_eq!(
            Constraint::at_most_one_of(b, a),
            Constraint::at_most_one_of(a, b)
        );
    }

    #[test]
    fn test_normalize() {
        let expr = LinearExpr::new()
            .with_term(VarId(2), 1)
            .with_term(VarId(0), -1)
            .with_term(VarId(2), 2)
            .with_term(VarId(1), 1)
            .with_term(VarId(1), -1);
        let constraint = Constraint::new(expr, Sense::Ge, 1);
        assert_eq!(constraint.expr().terms(), &[(VarId(0), -1), (VarId(2), 3)]);
    }

    #[test]
    fn test_is_satisfied_by() {
        let defs = defs();
        let mut program = IntegerProgram::new(&defs);
        program.push(Constraint::at_most_one_of(VarId(0), VarId(1)));
        program.push(Constraint::new(
            LinearExpr::sum([VarId(0), VarId(1)]).with_term(VarId(2), -1),
            Sense::Eq,
            0,
        ));
        assert!(program.is_satisfied_by(&[1, 0, 1]));
        assert!(!program.is_satisfied_by(&[1, 1, 2]), "x + y <= 1 violated");
        assert!(!program.is_satisfied_by(&[0, 0, 3]), "n out of bounds");
        assert!(!program.is_satisfied_by(&[0, 0]), "wrong variable count");
    }

    #[test]
    fn test_lp_display() {
        let defs = defs();
        let cached = Constraint::new(
            LinearExpr::new().with_term(VarId(2), 1).with_term(VarId(0), -1),
            Sense::Ge,
            1,
        );
        let mut program = IntegerProgram::new(&defs);
        program.push_cached(&cached);
        program.push(Constraint::at_most_one_of(VarId(0), VarId(1)));
        program.set_objective(LinearExpr::sum([VarId(2)]));
        assert_eq!(program.cached_constraint_count(), 1);

        let expected = "\
Minimize
 obj: + 1 n
Subject To
 c0: - 1 x + 1 n >= 1
 c1: + 1 x + 1 y <= 1
Bounds
 0 <= n <= 2
Binaries
 x
 y
Generals
 n
End
";
        assert_eq!(program.lp_display().to_string(), expected);
    }
}
