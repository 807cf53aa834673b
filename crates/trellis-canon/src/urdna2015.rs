//! URDNA2015 blank node canonicalization.
//!
//! <https://www.w3.org/TR/rdf-canon/>

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use sha2::{Digest, Sha256};

use crate::error::CanonicalizationError;
use crate::rdf::{Dataset, Quad};

/// Issues sequential blank node identifiers with a fixed prefix.
#[derive(Debug, Clone)]
struct IdentifierIssuer {
    prefix: &'static str,
    counter: usize,
    /// Existing identifiers in issue order.
    order: Vec<String>,
    issued: HashMap<String, String>,
}

impl IdentifierIssuer {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: 0,
            order: Vec::new(),
            issued: HashMap::new(),
        }
    }

    fn get(&self, existing: &str) -> Option<&str> {
        self.issued.get(existing).map(String::as_str)
    }

    fn issue(&mut self, existing: &str) -> String {
        if let Some(id) = self.issued.get(existing) {
            return id.clone();
        }
        let id = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.order.push(existing.to_string());
        self.issued.insert(existing.to_string(), id.clone());
        id
    }
}

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Lexicographic next permutation. Returns false after the last one.
fn next_permutation(items: &mut [usize]) -> bool {
    let Some(i) = items.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(j) = items.iter().rposition(|&x| x > items[i]) else {
        return false;
    };
    items.swap(i, j);
    items[i + 1..].reverse();
    true
}

/// Upper bound on n-degree hash calls plus permutations tried per dataset.
pub const DEFAULT_STEP_LIMIT: usize = 20_000;

struct Normalizer<'a> {
    quads: &'a [Quad],
    blank_to_quads: HashMap<String, Vec<usize>>,
    canonical: IdentifierIssuer,
    steps_left: Cell<usize>,
    step_limit: usize,
}

impl Normalizer<'_> {
    fn spend_step(&self) -> Result<(), CanonicalizationError> {
        match self.steps_left.get().checked_sub(1) {
            Some(left) => {
                self.steps_left.set(left);
                Ok(())
            }
            None => Err(CanonicalizationError::TooComplex {
                limit: self.step_limit,
            }),
        }
    }

    fn quads_for(&self, id: &str) -> Vec<&Quad> {
        self.blank_to_quads
            .get(id)
            .map(|indices| indices.iter().map(|&i| &self.quads[i]).collect())
            .unwrap_or_default()
    }

    fn hash_first_degree(&self, id: &str) -> String {
        let mut nquads: Vec<String> = self
            .quads_for(id)
            .into_iter()
            .map(|quad| {
                quad.map_blank_nodes(|label| {
                    let replacement = if label == id { "_:a" } else { "_:z" };
                    replacement.to_string()
                })
                .to_string()
            })
            .collect();
        nquads.sort();
        sha256_hex(&nquads.concat())
    }

    fn hash_related(
        &self,
        related: &str,
        quad: &Quad,
        issuer: &IdentifierIssuer,
        position: char,
    ) -> String {
        let identifier = self
            .canonical
            .get(related)
            .or_else(|| issuer.get(related))
            .map(str::to_string)
            .unwrap_or_else(|| self.hash_first_degree(related));
        let mut input = position.to_string();
        if position != 'g' {
            input.push('<');
            input.push_str(&quad.predicate);
            input.push('>');
        }
        input.push_str(&identifier);
        sha256_hex(&input)
    }

    fn hash_n_degree(
        &self,
        id: &str,
        issuer: &IdentifierIssuer,
    ) -> Result<(String, IdentifierIssuer), CanonicalizationError> {
        self.spend_step()?;
        let mut issuer = issuer.clone();

        let mut related_by_hash: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for quad in self.quads_for(id) {
            for (label, position) in quad.blank_nodes() {
                if label != id {
                    let hash = self.hash_related(label, quad, &issuer, position);
                    related_by_hash
                        .entry(hash)
                        .or_default()
                        .push(label.to_string());
                }
            }
        }

        let mut data = String::new();
        for (related_hash, related) in related_by_hash {
            data.push_str(&related_hash);
            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<IdentifierIssuer> = None;

            let mut permutation: Vec<usize> = (0..related.len()).collect();
            let mut first = true;
            'permutation: while first || next_permutation(&mut permutation) {
                first = false;
                self.spend_step()?;
                let mut issuer_copy = issuer.clone();
                let mut path = String::new();
                let mut recursion = Vec::new();

                for &index in &permutation {
                    let node = &related[index];
                    if let Some(canonical) = self.canonical.get(node) {
                        path.push_str(canonical);
                    } else {
                        if issuer_copy.get(node).is_none() {
                            recursion.push(node.clone());
                        }
                        path.push_str(&issuer_copy.issue(node));
                    }
                    if worse(&path, &chosen_path) {
                        continue 'permutation;
                    }
                }

                for node in recursion {
                    let (hash, result_issuer) = self.hash_n_degree(&node, &issuer_copy)?;
                    path.push_str(&issuer_copy.issue(&node));
                    path.push('<');
                    path.push_str(&hash);
                    path.push('>');
                    issuer_copy = result_issuer;
                    if worse(&path, &chosen_path) {
                        continue 'permutation;
                    }
                }

                if chosen_path.is_empty() || path < chosen_path {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
            }

            data.push_str(&chosen_path);
            issuer = chosen_issuer.ok_or_else(|| CanonicalizationError::MissingIdentifier(id.to_string()))?;
        }

        Ok((sha256_hex(&data), issuer))
    }
}

fn worse(path: &str, chosen: &str) -> bool {
    !chosen.is_empty() && path.len() >= chosen.len() && path > chosen
}

/// Relabel every blank node in `dataset` with its canonical `_:c14n` label.
pub fn normalize(dataset: &Dataset) -> Result<Dataset, CanonicalizationError> {
    normalize_with_limit(dataset, DEFAULT_STEP_LIMIT)
}

/// [`normalize`] with an explicit work bound. Datasets whose blank nodes
/// need more than `step_limit` steps fail with `TooComplex`.
pub fn normalize_with_limit(
    dataset: &Dataset,
    step_limit: usize,
) -> Result<Dataset, CanonicalizationError> {
    let quads = dataset.quads();
    let mut blank_to_quads: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, quad) in quads.iter().enumerate() {
        for (label, _) in quad.blank_nodes() {
            let entry = blank_to_quads.entry(label.to_string()).or_default();
            if entry.last() != Some(&i) {
                entry.push(i);
            }
        }
    }

    let mut state = Normalizer {
        quads,
        blank_to_quads,
        canonical: IdentifierIssuer::new("_:c14n"),
        steps_left: Cell::new(step_limit),
        step_limit,
    };

    let mut pending: BTreeSet<String> = state.blank_to_quads.keys().cloned().collect();
    let mut shared: BTreeMap<String, Vec<String>>;
    loop {
        let mut by_hash: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for id in &pending {
            by_hash
                .entry(state.hash_first_degree(id))
                .or_default()
                .push(id.clone());
        }

        let mut simple = false;
        shared = BTreeMap::new();
        for (hash, ids) in by_hash {
            if ids.len() == 1 {
                state.canonical.issue(&ids[0]);
                pending.remove(&ids[0]);
                simple = true;
            } else {
                shared.insert(hash, ids);
            }
        }
        if !simple {
            break;
        }
    }

    for ids in shared.values() {
        let mut paths = Vec::new();
        for id in ids {
            if state.canonical.get(id).is_some() {
                continue;
            }
            let mut temporary = IdentifierIssuer::new("_:b");
            temporary.issue(id);
            paths.push(state.hash_n_degree(id, &temporary)?);
        }
        paths.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, issuer) in paths {
            for existing in &issuer.order {
                state.canonical.issue(existing);
            }
        }
    }

    let mut normalized = Dataset::new();
    for quad in quads {
        let mut missing = None;
        let relabeled = quad.map_blank_nodes(|label| match state.canonical.get(label) {
            Some(id) => id.to_string(),
            None => {
                missing = Some(label.to_string());
                label.to_string()
            }
        });
        if let Some(label) = missing {
            return Err(CanonicalizationError::MissingIdentifier(label));
        }
        normalized.insert(relabeled);
    }
    Ok(normalized)
}
