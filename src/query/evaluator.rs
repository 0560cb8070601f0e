//! Document-at-a-time query evaluation over a set of inverted-list
//! cursors, one per query term. Conjunctive mode lockstep-converges on
//! the maximum current doc ID across cursors via `next_geq`;
//! disjunctive mode drives a min-heap over cursor doc IDs and sums the
//! contributions of every cursor currently sitting on the winning doc.
//! Top-10 extraction keeps a fixed-size max-heap of the worst-scoring
//! survivor so it can be evicted in `O(log 10)` as better candidates
//! arrive.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Result;
use crate::index::Cursor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredDoc {
    pub doc_id: u32,
    pub score: f32,
}

/// Wraps a `ScoredDoc` with the tie-break rule top-10 extraction needs:
/// higher score wins, and on equal score the smaller doc ID wins. The
/// `Ord` impl here is used to find the *worst* survivor in a
/// fixed-size max-heap, so it compares the opposite way: "greater"
/// means "worse" (lower score, or higher doc ID on a tie).
struct Ranked(ScoredDoc);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.0.score == other.0.score && self.0.doc_id == other.0.doc_id
    }
}
impl Eq for Ranked {}
impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.0.score.total_cmp(&self.0.score) {
            Ordering::Equal => self.0.doc_id.cmp(&other.0.doc_id),
            ord => ord,
        }
    }
}
impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const TOP_K: usize = 10;

fn push_candidate(heap: &mut BinaryHeap<Ranked>, candidate: ScoredDoc) {
    if heap.len() < TOP_K {
        heap.push(Ranked(candidate));
        return;
    }
    // heap.peek() is the current worst survivor (max under Ranked's
    // reversed ordering); replace it if the candidate ranks better.
    if let Some(worst) = heap.peek() {
        if Ranked(candidate).cmp(worst) == Ordering::Less {
            heap.pop();
            heap.push(Ranked(candidate));
        }
    }
}

fn drain_sorted(heap: BinaryHeap<Ranked>) -> Vec<ScoredDoc> {
    let mut docs: Vec<ScoredDoc> = heap.into_iter().map(|r| r.0).collect();
    docs.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.doc_id.cmp(&b.doc_id),
        ord => ord,
    });
    docs
}

/// Conjunctive (AND) evaluation: every cursor must agree on the
/// current doc ID. Cursors lockstep-advance to the maximum current doc
/// ID seen via `next_geq` until either all agree or one exhausts.
fn evaluate_and(mut cursors: Vec<Cursor>) -> Result<Vec<ScoredDoc>> {
    let mut heap = BinaryHeap::new();
    if cursors.is_empty() {
        return Ok(Vec::new());
    }

    let Some(mut candidate) = cursors[0].doc_id() else {
        return Ok(Vec::new());
    };

    'outer: loop {
        for cursor in &mut cursors {
            match cursor.next_geq(candidate)? {
                Some(doc_id) if doc_id == candidate => continue,
                Some(doc_id) => {
                    candidate = doc_id;
                    continue 'outer;
                }
                None => break 'outer,
            }
        }

        // every cursor now sits on `candidate`.
        let score: f32 = cursors.iter().filter_map(|c| c.score()).sum();
        push_candidate(&mut heap, ScoredDoc { doc_id: candidate, score });

        match cursors[0].next()? {
            Some(doc_id) => candidate = doc_id,
            None => break,
        }
    }
    Ok(drain_sorted(heap))
}

/// Disjunctive (OR) evaluation: a min-heap over cursor doc IDs picks
/// the smallest current doc ID each round; every cursor sitting on
/// that doc ID contributes its score, then advances.
fn evaluate_or(mut cursors: Vec<Cursor>) -> Result<Vec<ScoredDoc>> {
    let mut heap = BinaryHeap::new();

    loop {
        let min_doc_id = cursors.iter().filter_map(|c| c.doc_id()).min();
        let Some(min_doc_id) = min_doc_id else { break };

        let mut score = 0.0f32;
        for cursor in &mut cursors {
            if cursor.doc_id() == Some(min_doc_id) {
                score += cursor.score().unwrap_or(0.0);
                cursor.next()?;
            }
        }
        push_candidate(&mut heap, ScoredDoc { doc_id: min_doc_id, score });
    }

    Ok(drain_sorted(heap))
}

pub fn evaluate(cursors: Vec<Cursor>, mode: Mode) -> Result<Vec<ScoredDoc>> {
    match mode {
        Mode::And => evaluate_and(cursors),
        Mode::Or => evaluate_or(cursors),
    }
}
