//! Directionality resolver: did the record come from the customer or the page?
//!
//! A heuristic over ambiguous participant identifiers, not a guarantee. The
//! final fallback attributes the record to the business; that default is
//! legacy behavior kept on purpose — callers should watch the `ambiguous`
//! flag (surfaced as `direction_fallbacks` in the sync report) rather than
//! trust it.

/// Outcome of direction resolution. `ambiguous` is true only when neither the
/// sender nor the recipient list matched either party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionDecision {
    pub from_customer: bool,
    pub ambiguous: bool,
}

/// Pure function of (from, to, customer PSID, page id). Decision order:
/// sender id match first, then recipient-list inference, then the legacy
/// "not from customer" default.
pub fn resolve_direction(
    from: Option<&str>,
    to: &[String],
    customer_psid: &str,
    page_id: &str,
) -> DirectionDecision {
    if let Some(sender) = from {
        if sender == customer_psid {
            return DirectionDecision {
                from_customer: true,
                ambiguous: false,
            };
        }
        if sender == page_id {
            return DirectionDecision {
                from_customer: false,
                ambiguous: false,
            };
        }
    }

    let to_customer = to.iter().any(|id| id == customer_psid);
    let to_page = to.iter().any(|id| id == page_id);

    if to_customer && !to_page {
        // Addressed to the customer: the page sent it.
        return DirectionDecision {
            from_customer: false,
            ambiguous: false,
        };
    }
    if to_page && !to_customer {
        return DirectionDecision {
            from_customer: true,
            ambiguous: false,
        };
    }

    DirectionDecision {
        from_customer: false,
        ambiguous: true,
    }
}
