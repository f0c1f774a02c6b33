use crate::common::*;

/// Solve the rectangular minimum-cost assignment problem.
///
/// Returns `min(rows, cols)` `(row, col)` pairs sorted by row, with no index
/// repeated on either side. Ties resolve to the first optimal column found
/// when scanning columns in order. Every cost must be finite.
pub fn linear_sum_assignment(cost: ArrayView2<'_, f64>) -> Result<Vec<(usize, usize)>> {
    ensure!(
        cost.iter().all(|value| value.is_finite()),
        "cost matrix contains non-finite values"
    );

    let (rows, cols) = cost.dim();
    if rows == 0 || cols == 0 {
        return Ok(vec![]);
    }

    let mut pairs = if rows <= cols {
        solve(cost)
    } else {
        solve(cost.t())
            .into_iter()
            .map(|(row, col)| (col, row))
            .collect()
    };
    pairs.sort_unstable();
    Ok(pairs)
}

/// Hungarian method with potentials in O(n^2 m), requiring `n <= m`.
///
/// Rows are inserted one at a time and an augmenting path is grown from
/// each by Dijkstra-like relaxation on the reduced costs. Index 0 of the
/// column arrays is a virtual column holding the row being inserted.
fn solve(cost: ArrayView2<'_, f64>) -> Vec<(usize, usize)> {
    let (n, m) = cost.dim();
    debug_assert!(n <= m);

    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    // owner[j] is the 1-based row assigned to column j, 0 if free
    let mut owner = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        owner[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[col0] = true;
            let row0 = owner[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0;

            for col in 1..=m {
                if used[col] {
                    continue;
                }
                let reduced = cost[[row0 - 1, col - 1]] - u[row0] - v[col];
                if reduced < min_slack[col] {
                    min_slack[col] = reduced;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=m {
                if used[col] {
                    u[owner[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }

        // flip the augmenting path
        loop {
            let col1 = way[col0];
            owner[col0] = owner[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    (1..=m)
        .filter(|&col| owner[col] != 0)
        .map(|col| (owner[col] - 1, col - 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn total_cost(cost: &Array2<f64>, pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(row, col)| cost[[row, col]]).sum()
    }

    /// Exhaustive minimum over all injective row-to-column maps.
    fn brute_force(cost: &Array2<f64>) -> f64 {
        let (rows, cols) = cost.dim();
        if rows > cols {
            return brute_force(&cost.t().to_owned());
        }
        (0..cols)
            .permutations(rows)
            .map(|perm| {
                perm.iter()
                    .enumerate()
                    .map(|(row, &col)| cost[[row, col]])
                    .sum::<f64>()
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn square_assignment() -> Result<()> {
        let cost = array![[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]];
        let pairs = linear_sum_assignment(cost.view())?;
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
        assert_eq!(total_cost(&cost, &pairs), 5.0);
        Ok(())
    }

    #[test]
    fn rectangular_assignment() -> Result<()> {
        let wide = array![[10.0, 1.0, 7.0, 3.0], [2.0, 8.0, 1.5, 9.0]];
        let pairs = linear_sum_assignment(wide.view())?;
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);

        let tall = wide.t().to_owned();
        let pairs = linear_sum_assignment(tall.view())?;
        assert_eq!(pairs, vec![(1, 0), (2, 1)]);
        Ok(())
    }

    #[test]
    fn matches_brute_force() -> Result<()> {
        // deterministic pseudo-random costs, including negative values
        let mut state = 7u64;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 1000) as f64 / 100.0 - 3.0
        };

        for (rows, cols) in iproduct!(1..=5, 1..=5) {
            let cost = Array2::from_shape_simple_fn((rows, cols), &mut next);
            let pairs = linear_sum_assignment(cost.view())?;

            assert_eq!(pairs.len(), rows.min(cols));
            assert!(pairs.iter().map(|&(row, _)| row).unique().count() == pairs.len());
            assert!(pairs.iter().map(|&(_, col)| col).unique().count() == pairs.len());
            approx::assert_abs_diff_eq!(
                total_cost(&cost, &pairs),
                brute_force(&cost),
                epsilon = 1e-9
            );
        }
        Ok(())
    }

    #[test]
    fn degenerate_inputs() -> Result<()> {
        assert!(linear_sum_assignment(Array2::<f64>::zeros((0, 3)).view())?.is_empty());
        assert!(linear_sum_assignment(Array2::<f64>::zeros((2, 0)).view())?.is_empty());

        let ties = Array2::<f64>::zeros((2, 2));
        assert_eq!(linear_sum_assignment(ties.view())?.len(), 2);

        let bad = array![[1.0, f64::NAN]];
        assert!(linear_sum_assignment(bad.view()).is_err());
        Ok(())
    }
}
