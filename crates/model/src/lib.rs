// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! The currency and amount model for [Prism](https://github.com/prism-explorer/prism).
//!
//! The `prism-model` crate provides:
//! - [`types::Currency`]: token and USD descriptors carrying spot and hourly USD prices.
//! - [`types::Amount`]: exact 256-bit fixed-point amounts with display formatting and
//!   historical or spot conversion between tokens and USD.
//! - [`registry::CurrencyRegistry`]: a read-only lookup of currencies by id and by symbol.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod enums;
pub mod registry;
pub mod types;
