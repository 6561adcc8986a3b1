//! Factory for typed parameters.
//!
//! The factory hands out unbound [`Parameter`]s and keeps nothing but a
//! count of what it created.  Ownership goes to the caller.

use std::collections::HashMap;

use tracing::debug;

use super::parameter::Parameter;
use super::value::{ParamKind, ParamType};

/// Creates [`Parameter`]s of any supported type.
#[derive(Debug, Default)]
pub struct ParameterFactory {
    created: HashMap<ParamKind, usize>,
}

impl ParameterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unbound parameter whose default is the zero value of `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tzfix_core::{BindingState, ParameterFactory};
    ///
    /// let mut factory = ParameterFactory::new();
    /// let channels = factory.create_parameter::<i32>("Audio Channels");
    /// assert_eq!(*channels.get_value(), 0);
    /// assert_eq!(channels.state(), BindingState::Unbound);
    /// ```
    pub fn create_parameter<T: ParamType>(&mut self, label: &str) -> Parameter<T> {
        self.create_parameter_with_default(label, T::zero())
    }

    /// Creates an unbound parameter with a call-site default.
    pub fn create_parameter_with_default<T: ParamType>(
        &mut self,
        label: &str,
        default: T,
    ) -> Parameter<T> {
        *self.created.entry(T::KIND).or_insert(0) += 1;
        debug!("creating {} parameter {label:?}", T::KIND);
        Parameter::new(label, default)
    }

    /// How many parameters of `kind` this factory has created.
    pub fn created(&self, kind: ParamKind) -> usize {
        self.created.get(&kind).copied().unwrap_or(0)
    }

    /// How many parameters this factory has created in total.
    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }
}
