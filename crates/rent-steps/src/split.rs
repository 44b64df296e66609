//! Partición reproducible de filas en train / test.
//!
//! Con `stratify` las filas se agrupan por etiqueta (nulos forman su propio
//! grupo) y cada grupo aporta `round(len * test_size)` filas al test. La
//! semilla fija el resultado. Ambas particiones salen en el orden original.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

pub fn split_indices(n: usize, labels: Option<&[String]>, test_size: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    match labels {
        Some(labels) => {
            for (i, l) in labels.iter().enumerate().take(n) {
                groups.entry(l.as_str()).or_default().push(i);
            }
        }
        None => {
            groups.insert("", (0..n).collect());
        }
    }

    let mut test = Vec::new();
    let mut train = Vec::new();
    for (_, mut rows) in groups {
        rows.shuffle(&mut rng);
        let k = ((rows.len() as f64) * test_size).round() as usize;
        let k = k.min(rows.len());
        test.extend_from_slice(&rows[..k]);
        train.extend_from_slice(&rows[k..]);
    }
    test.sort_unstable();
    train.sort_unstable();
    Split { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_split() {
        let a = split_indices(50, None, 0.2, 42);
        let b = split_indices(50, None, 0.2, 42);
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 10);
        assert_eq!(a.train.len() + a.test.len(), 50);
        assert_ne!(a, split_indices(50, None, 0.2, 7));
    }

    #[test]
    fn stratified_split_keeps_group_proportions() {
        let labels: Vec<String> = (0..40).map(|i| if i < 30 { "Manhattan" } else { "Bronx" }.to_string()).collect();
        let s = split_indices(labels.len(), Some(&labels), 0.2, 42);
        let bronx_in_test = s.test.iter().filter(|&&i| labels[i] == "Bronx").count();
        assert_eq!(bronx_in_test, 2);
        assert_eq!(s.test.len(), 8);
        assert!(s.test.windows(2).all(|w| w[0] < w[1]));
        assert!(s.train.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn tiny_inputs_do_not_panic() {
        assert_eq!(split_indices(0, None, 0.3, 1), Split { train: vec![], test: vec![] });
        let s = split_indices(1, None, 0.3, 1);
        assert_eq!(s.train.len() + s.test.len(), 1);
    }
}
