//! Tie-break policy for candidate outcomes.
//!
//! When several routes partially match a request (right path but wrong
//! verb, no route at all), the dispatch loop keeps the most informative
//! candidate. The ranking is a strict total order over four classes, so
//! folding over any ordering of the same candidate set yields the same
//! winner.

use axum::http::StatusCode;

use crate::payload::Payload;

/// Outcome classes, best first. The derived [`Ord`] follows declaration
/// order, so "smaller" means "better".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutcomeClass {
    Success,
    MethodNotAllowed,
    Redirect,
    NotFound,
}

impl OutcomeClass {
    pub fn of(status: StatusCode) -> Self {
        if status.is_success() {
            Self::Success
        } else if status == StatusCode::METHOD_NOT_ALLOWED {
            Self::MethodNotAllowed
        } else if status.is_redirection() {
            Self::Redirect
        } else {
            Self::NotFound
        }
    }
}

/// True iff `a` strictly outranks `b`. Irreflexive: equal classes are never
/// better than each other, in either direction.
pub fn is_better(a: &Payload, b: &Payload) -> bool {
    OutcomeClass::of(a.status()) < OutcomeClass::of(b.status())
}

/// Folds [`is_better`] over the candidates, seeded with the first one so a
/// sole candidate survives with its body and headers intact; an empty set
/// yields a bare 404. The winner is independent of candidate order.
pub fn pick_best(candidates: impl IntoIterator<Item = Payload>) -> Payload {
    let mut candidates = candidates.into_iter();
    let Some(mut best) = candidates.next() else {
        return Payload::not_found();
    };
    for candidate in candidates {
        if is_better(&candidate, &best) {
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contenders() -> [Payload; 4] {
        [
            Payload::ok(),
            Payload::method_not_allowed(),
            Payload::see_other("/"),
            Payload::not_found(),
        ]
    }

    #[test]
    fn strict_total_order_over_the_four_classes() {
        let all = contenders();

        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i == j {
                    assert!(!is_better(a, b), "class {i} must not beat itself");
                } else {
                    // exactly one direction wins
                    assert_eq!(
                        is_better(a, b),
                        !is_better(b, a),
                        "classes {i} and {j} must be strictly ordered"
                    );
                    assert_eq!(is_better(a, b), i < j);
                }
            }
        }
    }

    #[test]
    fn pick_best_is_order_independent() {
        let forward = pick_best(contenders());
        assert_eq!(forward.status(), StatusCode::OK);

        let mut reversed = contenders();
        reversed.reverse();
        let backward = pick_best(reversed);
        assert_eq!(backward.status(), StatusCode::OK);
    }

    #[test]
    fn wrong_method_beats_redirect_and_missing() {
        let best = pick_best([
            Payload::not_found(),
            Payload::see_other("/elsewhere"),
            Payload::method_not_allowed(),
        ]);

        assert_eq!(best.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn empty_candidate_set_is_not_found() {
        assert_eq!(pick_best([]).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn sole_candidate_survives_intact() {
        let custom = Payload::empty(StatusCode::NOT_FOUND).with_content_type("text/plain");

        let best = pick_best([custom]);

        assert_eq!(best.status(), StatusCode::NOT_FOUND);
        assert_eq!(best.content_type(), Some("text/plain"));
    }
}
