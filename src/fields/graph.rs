//! Dependency ordering for derived fields.
//!
//! A derived field (`days_after_field`, `copy_of`) must be drawn after the
//! field it reads. Fields are ordered with Kahn's algorithm; anything left
//! with unresolved dependencies is part of a cycle.

use std::collections::VecDeque;

/// Result of ordering the field table
#[derive(Debug)]
pub struct DrawOrder {
    /// Field indices, dependencies before dependents
    pub order: Vec<usize>,
    /// Field indices that could not be ordered (cycles)
    pub cyclic: Vec<usize>,
}

/// Order `n` fields given `parent[i]`, the index field `i` reads from.
///
/// Ties keep table order so the draw sequence (and therefore the random
/// stream) is stable for a given table.
pub fn draw_order(parents: &[Option<usize>]) -> DrawOrder {
    let n = parents.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];

    for (child, parent) in parents.iter().enumerate() {
        if let Some(parent) = *parent {
            children[parent].push(child);
            in_degree[child] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(field) = queue.pop_front() {
        order.push(field);
        for &child in &children[field] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    let cyclic = (0..n).filter(|&i| in_degree[i] > 0).collect();

    DrawOrder { order, cyclic }
}
