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

//! Subgraph query construction and batch pagination for [Prism](https://github.com/prism-explorer/prism).
//!
//! The `prism-query` crate provides:
//! - [`builder::QueryBuilder`]: renders single-page and cursor-batch GraphQL documents.
//! - [`paged::PagedQuery`]: serialized page and batch fetching with retries and cancellation.
//! - [`descriptor::EntityDescriptor`]: per-entity query configuration as plain data.
//! - [`catalog`]: the token entity and the currency registry loader.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod builder;
pub mod catalog;
pub mod column;
pub mod descriptor;
pub mod enums;
pub mod error;
pub mod executor;
pub mod paged;
pub mod parsers;
pub mod row;
