//! Incoming cart update payloads.
//!
//! Requests are accepted in the shape the cart form posts:
//!
//! ```json
//! { "12": { "qty": "3" }, "13": { "qty": 1.5 }, "14": { "remove": true }, "15": "2" }
//! ```
//!
//! Quantities stay raw here. Turning them into something persistable is the
//! normalizer's job; this module only drops entries that cannot be read at all.

use serde_json::{Map, Value};

use cartkeeper_core::CartLineId;

use super::models::CartSnapshot;

/// The raw quantity a caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedQuantity {
    /// Quantity as submitted, not yet parsed.
    Raw(String),
    /// Remove the line from the cart.
    Remove,
}

/// A single requested change to a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineUpdate {
    pub line_id: CartLineId,
    pub requested: RequestedQuantity,
}

impl CartLineUpdate {
    /// Request a quantity for a line.
    #[must_use]
    pub fn quantity(line_id: CartLineId, raw: impl Into<String>) -> Self {
        Self {
            line_id,
            requested: RequestedQuantity::Raw(raw.into()),
        }
    }

    /// Request removal of a line.
    #[must_use]
    pub const fn remove(line_id: CartLineId) -> Self {
        Self {
            line_id,
            requested: RequestedQuantity::Remove,
        }
    }
}

/// A batch of line updates, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartUpdateRequest {
    lines: Vec<CartLineUpdate>,
    skipped: usize,
}

impl CartUpdateRequest {
    /// Build a request from already-typed line updates.
    ///
    /// Later entries for the same line replace earlier ones.
    #[must_use]
    pub fn new(lines: Vec<CartLineUpdate>) -> Self {
        let mut request = Self::default();
        for line in lines {
            request.push(line);
        }
        request
    }

    /// Parse the JSON object posted by the cart form.
    ///
    /// Entries are skipped (and counted) when the key is not a line ID, the
    /// value is neither an object nor a scalar quantity, or an object carries
    /// neither `qty` nor `remove: true`.
    #[must_use]
    pub fn from_json(payload: &Map<String, Value>) -> Self {
        let mut request = Self::default();

        for (key, value) in payload {
            let Ok(line_id) = key.parse::<CartLineId>() else {
                tracing::debug!(key = %key, "Skipping cart update with invalid line id");
                request.skipped += 1;
                continue;
            };

            match requested_from_value(value) {
                Some(requested) => request.push(CartLineUpdate { line_id, requested }),
                None => {
                    tracing::debug!(%line_id, "Skipping malformed cart update entry");
                    request.skipped += 1;
                }
            }
        }

        request
    }

    /// Parse `line=qty` pairs, as passed on the command line.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut request = Self::default();

        for pair in pairs {
            let parsed = pair
                .split_once('=')
                .and_then(|(id, qty)| id.parse::<CartLineId>().ok().map(|id| (id, qty)));

            match parsed {
                Some((line_id, qty)) => request.push(CartLineUpdate::quantity(line_id, qty.trim())),
                None => request.skipped += 1,
            }
        }

        request
    }

    /// Request every line of a submitted snapshot at its submitted quantity.
    #[must_use]
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        let mut request = Self::new(
            snapshot
                .lines
                .iter()
                .map(|line| CartLineUpdate::quantity(line.line_id, line.quantity.clone()))
                .collect(),
        );
        request.skipped = snapshot.skipped;
        request
    }

    fn push(&mut self, update: CartLineUpdate) {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.line_id == update.line_id) {
            *existing = update;
        } else {
            self.lines.push(update);
        }
    }

    /// The parsed line updates.
    #[must_use]
    pub fn lines(&self) -> &[CartLineUpdate] {
        &self.lines
    }

    /// Number of entries dropped as unreadable.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Whether there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of line updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

fn requested_from_value(value: &Value) -> Option<RequestedQuantity> {
    match value {
        Value::Object(entry) => {
            if entry.get("remove").and_then(Value::as_bool) == Some(true) {
                return Some(RequestedQuantity::Remove);
            }
            entry.get("qty").and_then(scalar_text).map(RequestedQuantity::Raw)
        }
        scalar => scalar_text(scalar).map(RequestedQuantity::Raw),
    }
}

/// Text of a JSON string or number, trimmed. Anything else is unreadable.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
