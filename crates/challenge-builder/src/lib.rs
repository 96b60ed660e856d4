// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Validation and `challenge.yml` generation for the challenge builder form.
//!
//! Raw form state goes through the [`collector`], is checked by
//! [`pipeline::validate_form`] and rendered by [`document::generate_document`].

pub mod category;
pub mod collector;
pub mod config;
pub mod document;
pub mod form;
pub mod pipeline;
pub mod validation;

pub use category::Category;
pub use collector::{Counter, FlagCard, FormState, IdSequence, InstanceCard};
pub use document::{ChallengeDocument, GenerationError, generate_document};
pub use form::{ChallengeForm, DnsRecord, Flag, ServiceInstance};
pub use pipeline::{BuildError, Output, build_document, validate_form};
pub use validation::{FieldKind, ValidationResult, validate_collection, validate_field};
