//! Integration tests for srcbuild
//!
//! These tests drive real processes: fake `mvn`/`mvnw`/`gradlew` shell
//! scripts stand in for the build tools and record how they were invoked.

#![cfg(unix)]

pub mod build_executor;
pub mod helpers;
pub mod path_lock;
