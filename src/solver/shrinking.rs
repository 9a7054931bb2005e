//! Shrinking heuristic implementation
//!
//! Variables stuck at a bound whose gradient pushes them further outside the
//! feasible region are temporarily removed from the active set. Before the
//! solver declares convergence the gradient of the removed variables is
//! reconstructed and the whole set is checked again.

/// Position of a dual variable relative to its box constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaStatus {
    LowerBound,
    UpperBound,
    Free,
}

impl AlphaStatus {
    pub fn of(alpha: f64, upper: f64) -> Self {
        if alpha >= upper {
            Self::UpperBound
        } else if alpha <= 0.0 {
            Self::LowerBound
        } else {
            Self::Free
        }
    }
}

/// Set of variables the working-set selection currently looks at
#[derive(Debug, Clone)]
pub struct ActiveSet {
    members: Vec<usize>,
    size: usize,
    unshrunk: bool,
}

impl ActiveSet {
    /// All `size` variables active
    pub fn full(size: usize) -> Self {
        Self {
            members: (0..size).collect(),
            size,
            unshrunk: false,
        }
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether no variable is currently shrunk
    pub fn is_complete(&self) -> bool {
        self.members.len() == self.size
    }

    /// Variables currently shrunk
    pub fn inactive(&self) -> Vec<usize> {
        let mut active = vec![false; self.size];
        for &i in &self.members {
            active[i] = true;
        }
        (0..self.size).filter(|&i| !active[i]).collect()
    }

    pub fn activate_all(&mut self) {
        self.members = (0..self.size).collect();
    }

    /// Keep only the members for which `keep` holds
    pub fn retain<F: FnMut(usize) -> bool>(&mut self, mut keep: F) {
        self.members.retain(|&i| keep(i));
    }

    /// Whether the set has already been restored once close to the optimum
    pub fn unshrunk(&self) -> bool {
        self.unshrunk
    }

    pub fn mark_unshrunk(&mut self) {
        self.unshrunk = true;
    }
}

/// Maximal violations used by the shrinking test
///
/// Returns `(gmax1, gmax2)` where `gmax1 = max { -y_t G_t | t in I_up }` and
/// `gmax2 = max { y_t G_t | t in I_low }`.
pub fn violation_bounds(
    members: &[usize],
    y: &[f64],
    gradient: &[f64],
    status: &[AlphaStatus],
) -> (f64, f64) {
    let mut gmax1 = f64::NEG_INFINITY;
    let mut gmax2 = f64::NEG_INFINITY;
    for &i in members {
        let g = gradient[i];
        let not_upper = status[i] != AlphaStatus::UpperBound;
        let not_lower = status[i] != AlphaStatus::LowerBound;
        if y[i] > 0.0 {
            if not_upper {
                gmax1 = gmax1.max(-g);
            }
            if not_lower {
                gmax2 = gmax2.max(g);
            }
        } else {
            if not_upper {
                gmax2 = gmax2.max(-g);
            }
            if not_lower {
                gmax1 = gmax1.max(g);
            }
        }
    }
    (gmax1, gmax2)
}

/// Whether a variable can be removed from the active set
pub fn be_shrunk(status: AlphaStatus, y: f64, gradient: f64, gmax1: f64, gmax2: f64) -> bool {
    match status {
        AlphaStatus::UpperBound => {
            if y > 0.0 {
                -gradient > gmax1
            } else {
                -gradient > gmax2
            }
        }
        AlphaStatus::LowerBound => {
            if y > 0.0 {
                gradient > gmax2
            } else {
                gradient > gmax1
            }
        }
        AlphaStatus::Free => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_status() {
        assert_eq!(AlphaStatus::of(0.0, 1.0), AlphaStatus::LowerBound);
        assert_eq!(AlphaStatus::of(1.0, 1.0), AlphaStatus::UpperBound);
        assert_eq!(AlphaStatus::of(0.5, 1.0), AlphaStatus::Free);
    }

    #[test]
    fn test_active_set_shrink_and_restore() {
        let mut set = ActiveSet::full(5);
        assert!(set.is_complete());

        set.retain(|i| i % 2 == 0);
        assert_eq!(set.members(), &[0, 2, 4]);
        assert_eq!(set.inactive(), vec![1, 3]);
        assert!(!set.is_complete());

        set.activate_all();
        assert_eq!(set.len(), 5);
        assert!(set.inactive().is_empty());
    }

    #[test]
    fn test_free_variables_never_shrink() {
        assert!(!be_shrunk(AlphaStatus::Free, 1.0, 100.0, 0.0, 0.0));
    }

    #[test]
    fn test_bound_variables_shrink_when_beyond_violation() {
        // y = +1 at the lower bound with a large gradient cannot enter I_up
        assert!(be_shrunk(AlphaStatus::LowerBound, 1.0, 5.0, 1.0, 1.0));
        assert!(!be_shrunk(AlphaStatus::LowerBound, 1.0, 0.5, 1.0, 1.0));
        assert!(be_shrunk(AlphaStatus::UpperBound, -1.0, -5.0, 1.0, 1.0));
    }

    #[test]
    fn test_violation_bounds() {
        let y = [1.0, -1.0];
        let gradient = [-2.0, 3.0];
        let status = [AlphaStatus::LowerBound, AlphaStatus::LowerBound];
        let (gmax1, gmax2) = violation_bounds(&[0, 1], &y, &gradient, &status);
        assert_eq!(gmax1, 2.0);
        assert_eq!(gmax2, -3.0);
    }
}
