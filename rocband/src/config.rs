//! Band engine configuration.

/// How per-curve instance counts are combined into the `P` and `N` used by
/// the binomial, fixed-width and Kolmogorov-Smirnov procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstanceCountPolicy {
    /// Sum over all curves.
    #[default]
    Sum,
    /// Integer mean over all curves.
    Average,
    /// Largest count of any curve.
    Max,
    /// Counts of the first curve.
    First,
}

impl InstanceCountPolicy {
    /// Aggregate `(positive, negative)` counts.
    pub fn aggregate<I>(self, counts: I) -> (usize, usize)
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut iter = counts.into_iter();
        match self {
            InstanceCountPolicy::First => iter.next().unwrap_or((0, 0)),
            InstanceCountPolicy::Max => {
                iter.fold((0, 0), |(p, n), (cp, cn)| (p.max(cp), n.max(cn)))
            }
            InstanceCountPolicy::Sum | InstanceCountPolicy::Average => {
                let (mut p, mut n, mut len) = (0usize, 0usize, 0usize);
                for (cp, cn) in iter {
                    p += cp;
                    n += cn;
                    len += 1;
                }
                if self == InstanceCountPolicy::Average && len > 0 {
                    (p / len, n / len)
                } else {
                    (p, n)
                }
            }
        }
    }
}

/// Configuration of a [`BandEngine`](crate::band::BandEngine).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandConfig {
    /// Instance count aggregation.
    pub count_policy: InstanceCountPolicy,
    /// Dichotomy steps of the fixed-width bandwidth search.
    pub fixed_width_iterations: usize,
    /// Emit `info` events with search traces and count summaries.
    pub verbose: bool,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            count_policy: InstanceCountPolicy::Sum,
            fixed_width_iterations: 20,
            verbose: false,
        }
    }
}

impl BandConfig {
    pub fn with_count_policy(mut self, policy: InstanceCountPolicy) -> Self {
        self.count_policy = policy;
        self
    }

    pub fn with_fixed_width_iterations(mut self, iterations: usize) -> Self {
        self.fixed_width_iterations = iterations;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
