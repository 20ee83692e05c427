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

//! The `tokens` entity of a Uniswap style subgraph.

use crate::{
    column::ColumnDescriptor,
    descriptor::EntityDescriptor,
    enums::ColumnDataType,
};

/// The entity collection name of tokens.
pub const TOKENS_ENTITY: &str = "tokens";

/// Returns the columns of the token table.
#[must_use]
pub fn token_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "Address", ColumnDataType::Id),
        ColumnDescriptor::new("symbol", "Symbol", ColumnDataType::Text),
        ColumnDescriptor::new("name", "Name", ColumnDataType::Text),
        ColumnDescriptor::new("decimals", "Decimals", ColumnDataType::BigInt),
        ColumnDescriptor::new("derivedETH", "Price (ETH)", ColumnDataType::BigDecimal),
        ColumnDescriptor::new("volumeUSD", "Volume", ColumnDataType::Amount),
        ColumnDescriptor::new("totalValueLockedUSD", "TVL", ColumnDataType::Amount),
        ColumnDescriptor::new("txCount", "Transactions", ColumnDataType::BigInt),
    ]
}

/// Returns the descriptor of the token table, ordered by id.
///
/// # Panics
///
/// Panics if the static column set is invalid, which would be a programming error.
#[must_use]
pub fn tokens_descriptor() -> EntityDescriptor {
    EntityDescriptor::from_columns(TOKENS_ENTITY, token_columns())
        .expect(prism_core::correctness::FAILED)
}
