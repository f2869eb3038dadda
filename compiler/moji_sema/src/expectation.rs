//! Type expectations.

use moji_types::Type;

/// What the surrounding context expects of an expression.
///
/// Carried through `expect`; conversions (unwrap refusal, boxing,
/// thunking) are attempted only against an explicit expectation.
#[derive(Clone, Default, Debug)]
pub struct TypeExpectation {
    pub ty: Option<Type>,
}

impl TypeExpectation {
    /// No expectation; the expression's produced type stands.
    pub fn none() -> Self {
        TypeExpectation { ty: None }
    }

    pub fn of(ty: &Type) -> Self {
        TypeExpectation {
            ty: Some(ty.clone()),
        }
    }
}

impl From<Type> for TypeExpectation {
    fn from(ty: Type) -> Self {
        TypeExpectation { ty: Some(ty) }
    }
}
