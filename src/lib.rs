//! `ccbranch`: a static analyzer for C that forks its parser state into one *compilation branch*
//! per preprocessor conditional, so that every symbol a translation unit can declare or define
//! under some combination of `#if`/`#ifdef`/`#ifndef` predicates is found in a single pass, each
//! labeled with the boolean condition under which it exists.
//!
//! The engine lives in [`condition`] through [`driver`]; [`cli`] wraps it with the command-line
//! surface, and [`config`]/[`diagnostics`] are the ambient concerns both sides share.

pub mod arising;
pub mod branch;
pub mod cache;
pub mod cli;
pub mod condition;
pub mod config;
pub mod consolidate;
pub mod context;
pub mod diagnostics;
pub mod driver;
pub mod lexer;
pub mod recorder;
pub mod scope;
pub mod symbol;
