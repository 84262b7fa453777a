//! Zext Class Checker
//!
//! Cross-class analysis for the Zext extension compiler.
//!
//! This crate provides:
//! - Dependency ranking (compile order of classes and interfaces)
//! - Interface conformance checking
//! - Diagnostics for class model errors (terminal and JSON output)
//!
//! # Usage
//!
//! ```ignore
//! use zext_checker::{ConformanceChecker, DependencyRanker};
//! use zext_model::ClassRegistry;
//!
//! let registry = ClassRegistry::new();
//! // ... declare classes ...
//!
//! let order = DependencyRanker::new(&registry).rank(&registry.user_ids());
//! let checker = ConformanceChecker::new(&registry);
//! for id in order {
//!     let class = registry.get(id);
//!     checker.check_inherited(&class.read())?;
//! }
//! ```

pub mod conformance;
pub mod diagnostic;
pub mod ranker;

pub use conformance::ConformanceChecker;
pub use diagnostic::{create_files, error_code, Diagnostic, ErrorCode, SourceFiles};
pub use ranker::DependencyRanker;
