//! Static overloads of the binary operators.

use bagel_ast::BinaryOp;

use crate::analyzer::Analyzer;
use crate::types::Type;

/// `(left, right, result)` candidates for `op`, tried in order.
fn overloads(op: BinaryOp) -> Vec<(Type, Type, Type)> {
    use Type::{Boolean, Number, String, Unknown};

    match op {
        BinaryOp::Add => vec![
            (Number, Number, Number),
            (String, String, String),
            (String, Number, String),
            (Number, String, String),
        ],
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => vec![(Number, Number, Number)],
        BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEq | BinaryOp::GreaterEq => vec![
            (Number, Number, Boolean),
            (String, String, Boolean),
        ],
        BinaryOp::Eq | BinaryOp::NotEq => vec![(Unknown, Unknown, Boolean)],
        BinaryOp::And | BinaryOp::Or => vec![(Boolean, Boolean, Boolean)],
        BinaryOp::NullishCoalescing => Vec::new(),
    }
}

impl Analyzer<'_> {
    /// Result type of the first overload of `op` accepting both operands.
    pub(crate) fn binary_result(&self, op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
        overloads(op)
            .into_iter()
            .find(|(l, r, _)| self.subsumes(l, left, true) && self.subsumes(r, right, true))
            .map(|(_, _, result)| result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoImports;

    #[test]
    fn test_first_matching_overload_wins() {
        let analyzer = Analyzer::new(&NoImports);
        let result = |op, l: Type, r: Type| analyzer.binary_result(op, &l, &r);

        assert_eq!(
            result(BinaryOp::Add, Type::number_literal(1.0), Type::Number),
            Some(Type::Number)
        );
        assert_eq!(
            result(BinaryOp::Add, Type::String, Type::number_literal(1.0)),
            Some(Type::String)
        );
        assert_eq!(
            result(BinaryOp::Less, Type::String, Type::String),
            Some(Type::Boolean)
        );
        assert_eq!(result(BinaryOp::Less, Type::String, Type::Number), None);
        assert_eq!(
            result(BinaryOp::Eq, Type::Nil, Type::array(Type::Number)),
            Some(Type::Boolean)
        );
        assert_eq!(result(BinaryOp::And, Type::Boolean, Type::Nil), None);
    }

    #[test]
    fn test_generic_operands_use_their_constraint() {
        let analyzer = Analyzer::new(&NoImports);
        let t = Type::Generic {
            name: "T".into(),
            extends: Some(Box::new(Type::Number)),
        };
        assert_eq!(
            analyzer.binary_result(BinaryOp::Mul, &t, &Type::Number),
            Some(Type::Number)
        );
    }
}
