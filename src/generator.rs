use crate::config::{OperandBounds, SessionConfig};
use crate::error::GenerateError;
use crate::problem::{Operator, Problem};
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Upper bound on rejection-sampling rounds for constrained subtraction and
/// division before giving up.
pub const MAX_ATTEMPTS: usize = 100_000;

/// Produces random problems according to a [`SessionConfig`].
pub struct ProblemGenerator<R: Rng = ThreadRng> {
    config: SessionConfig,
    rng: R,
}

impl ProblemGenerator<ThreadRng> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rng(config, rand::thread_rng())
    }
}

impl<R: Rng> ProblemGenerator<R> {
    pub fn with_rng(config: SessionConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Picks an enabled operator uniformly and builds a problem for it.
    pub fn generate(&mut self) -> Result<Problem, GenerateError> {
        let operator = *self
            .config
            .operations
            .choose(&mut self.rng)
            .ok_or(GenerateError::NoOperations)?;
        self.generate_for(operator)
    }

    pub fn generate_for(&mut self, operator: Operator) -> Result<Problem, GenerateError> {
        match operator {
            Operator::Add => Ok(self.sample(Operator::Add, self.config.addition.bounds)),
            Operator::Multiply => {
                Ok(self.sample(Operator::Multiply, self.config.multiplication.bounds))
            }
            Operator::Subtract if self.config.override_subtraction => {
                let sum = self.sample(Operator::Add, self.config.addition.bounds);
                Self::reverse(sum, Operator::Subtract)
            }
            Operator::Divide if self.config.override_division => {
                let product = self.sample(Operator::Multiply, self.config.multiplication.bounds);
                Self::reverse(product, Operator::Divide)
            }
            Operator::Subtract => {
                let sub = self.config.subtraction;
                self.sample_until(Operator::Subtract, sub.bounds, |p| {
                    !sub.force_non_negative_difference || p.left >= p.right
                })
            }
            Operator::Divide => {
                let div = self.config.division;
                self.sample_until(Operator::Divide, div.bounds, |p| {
                    p.right != 0 && (!div.force_clean_division || p.left % p.right == 0)
                })
            }
        }
    }

    /// Turns `a + b` into `(a + b) - a`, or `a * b` into `(a * b) / a`.
    fn reverse(forward: Problem, operator: Operator) -> Result<Problem, GenerateError> {
        let result = forward
            .answer()
            .ok_or_else(|| GenerateError::Overflow(forward.to_string()))?;
        Ok(Problem::new(result, operator, forward.left))
    }

    fn sample(&mut self, operator: Operator, bounds: OperandBounds) -> Problem {
        Problem::new(
            self.rng.gen_range(bounds.min_left..=bounds.max_left),
            operator,
            self.rng.gen_range(bounds.min_right..=bounds.max_right),
        )
    }

    fn sample_until<F>(
        &mut self,
        operator: Operator,
        bounds: OperandBounds,
        accept: F,
    ) -> Result<Problem, GenerateError>
    where
        F: Fn(&Problem) -> bool,
    {
        for _ in 0..MAX_ATTEMPTS {
            let problem = self.sample(operator, bounds);
            if accept(&problem) {
                return Ok(problem);
            }
        }
        tracing::warn!(%operator, ?bounds, "rejection sampling exhausted");
        Err(GenerateError::Exhausted {
            operator: operator.symbol(),
            attempts: MAX_ATTEMPTS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperandBounds;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator(config: SessionConfig) -> ProblemGenerator<StdRng> {
        ProblemGenerator::with_rng(config, StdRng::seed_from_u64(7))
    }

    fn only(operator: Operator) -> SessionConfig {
        SessionConfig {
            operations: vec![operator],
            ..SessionConfig::default()
        }
    }

    #[test]
    fn addition_stays_in_bounds() {
        let mut gen = generator(only(Operator::Add));
        for _ in 0..1000 {
            let p = gen.generate().unwrap();
            assert_eq!(p.operator, Operator::Add);
            assert!((2..=100).contains(&p.left), "{p}");
            assert!((2..=100).contains(&p.right), "{p}");
        }
    }

    #[test]
    fn subtraction_without_override_is_non_negative() {
        let mut cfg = only(Operator::Subtract);
        cfg.override_subtraction = false;
        cfg.subtraction.bounds = OperandBounds::new(1, 50, 1, 100);
        let mut gen = generator(cfg);
        for _ in 0..1000 {
            let p = gen.generate().unwrap();
            assert_eq!(p.operator, Operator::Subtract);
            assert!(p.left >= p.right, "{p}");
            assert!((1..=50).contains(&p.left));
        }
    }

    #[test]
    fn subtraction_without_force_may_go_negative() {
        let mut cfg = only(Operator::Subtract);
        cfg.override_subtraction = false;
        cfg.subtraction.force_non_negative_difference = false;
        cfg.subtraction.bounds = OperandBounds::new(1, 2, 50, 60);
        let mut gen = generator(cfg);
        let p = gen.generate().unwrap();
        assert!(p.answer().unwrap() < 0);
    }

    #[test]
    fn division_without_override_is_clean() {
        let mut cfg = only(Operator::Divide);
        cfg.override_division = false;
        let mut gen = generator(cfg);
        for _ in 0..1000 {
            let p = gen.generate().unwrap();
            assert_eq!(p.operator, Operator::Divide);
            assert_ne!(p.right, 0);
            assert_eq!(p.left % p.right, 0, "{p}");
        }
    }

    #[test]
    fn override_subtraction_reverses_addition() {
        let mut gen = generator(only(Operator::Subtract));
        for _ in 0..1000 {
            let p = gen.generate().unwrap();
            assert_eq!(p.operator, Operator::Subtract);
            let answer = p.answer().unwrap();
            assert!((2..=100).contains(&p.right));
            assert!((2..=100).contains(&answer));
            assert!(answer >= 0);
        }
    }

    #[test]
    fn override_division_reverses_multiplication() {
        let mut gen = generator(only(Operator::Divide));
        for _ in 0..1000 {
            let p = gen.generate().unwrap();
            assert_eq!(p.operator, Operator::Divide);
            assert!((2..=12).contains(&p.right), "{p}");
            assert_eq!(p.left % p.right, 0);
            assert!((2..=100).contains(&p.answer().unwrap()));
        }
    }

    #[test]
    fn picks_only_enabled_operators() {
        let cfg = SessionConfig {
            operations: vec![Operator::Add, Operator::Multiply],
            ..SessionConfig::default()
        };
        let mut gen = generator(cfg);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(gen.generate().unwrap().operator);
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&Operator::Add) && seen.contains(&Operator::Multiply));
    }

    #[test]
    fn fixed_bounds_always_give_the_same_problem() {
        let mut cfg = only(Operator::Add);
        cfg.addition.bounds = OperandBounds::new(2, 2, 2, 2);
        let mut gen = generator(cfg);
        for _ in 0..10 {
            assert_eq!(gen.generate().unwrap(), Problem::new(2, Operator::Add, 2));
        }
    }

    #[test]
    fn unsatisfiable_division_is_reported() {
        let mut cfg = only(Operator::Divide);
        cfg.override_division = false;
        cfg.division.bounds = OperandBounds::new(7, 7, 2, 3);
        let mut gen = generator(cfg);
        assert_matches!(
            gen.generate(),
            Err(GenerateError::Exhausted { operator: '/', attempts: MAX_ATTEMPTS })
        );
    }

    #[test]
    fn zero_divisor_is_never_emitted() {
        let mut cfg = only(Operator::Divide);
        cfg.override_division = false;
        cfg.division.force_clean_division = false;
        cfg.division.bounds = OperandBounds::new(1, 10, 0, 1);
        let mut gen = generator(cfg);
        for _ in 0..200 {
            assert_eq!(gen.generate().unwrap().right, 1);
        }
    }

    #[test]
    fn empty_operations_is_an_error() {
        let mut gen = generator(SessionConfig {
            operations: vec![],
            ..SessionConfig::default()
        });
        assert_eq!(gen.generate(), Err(GenerateError::NoOperations));
    }
}
