//! Fallback estimates as ordered threshold tables.

/// Ordered `(threshold, value)` pairs, highest threshold first. A key takes the
/// value of the first band whose threshold it reaches, else `floor`.
#[derive(Debug, Clone, Copy)]
pub struct Bands<T: 'static> {
    pub bands: &'static [(i64, T)],
    pub floor: T,
}

impl<T: Copy> Bands<T> {
    pub fn lookup(&self, key: i64) -> T {
        self.bands
            .iter()
            .find(|(threshold, _)| key >= *threshold)
            .map(|(_, value)| *value)
            .unwrap_or(self.floor)
    }
}

/// Memory (MB) by complexity score.
pub const MEMORY_BY_COMPLEXITY: Bands<i64> = Bands {
    bands: &[(80, 2048), (60, 1024), (40, 512)],
    floor: 256,
};

/// CPU cores by API endpoint count.
pub const CPU_BY_ENDPOINTS: Bands<f64> = Bands {
    bands: &[(50, 4.0), (20, 2.0), (10, 1.0)],
    floor: 0.5,
};

pub fn memory_for_complexity(complexity: i64) -> i64 {
    MEMORY_BY_COMPLEXITY.lookup(complexity)
}

pub fn cpu_for_endpoints(endpoints: i64) -> f64 {
    CPU_BY_ENDPOINTS.lookup(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_ordered_descending() {
        for w in MEMORY_BY_COMPLEXITY.bands.windows(2) {
            assert!(w[0].0 > w[1].0);
        }
        for w in CPU_BY_ENDPOINTS.bands.windows(2) {
            assert!(w[0].0 > w[1].0);
        }
    }

    #[test]
    fn test_memory_band_edges() {
        assert_eq!(memory_for_complexity(100), 2048);
        assert_eq!(memory_for_complexity(80), 2048);
        assert_eq!(memory_for_complexity(79), 1024);
        assert_eq!(memory_for_complexity(60), 1024);
        assert_eq!(memory_for_complexity(40), 512);
        assert_eq!(memory_for_complexity(39), 256);
        assert_eq!(memory_for_complexity(0), 256);
    }

    #[test]
    fn test_cpu_band_edges() {
        assert_eq!(cpu_for_endpoints(120), 4.0);
        assert_eq!(cpu_for_endpoints(50), 4.0);
        assert_eq!(cpu_for_endpoints(20), 2.0);
        assert_eq!(cpu_for_endpoints(19), 1.0);
        assert_eq!(cpu_for_endpoints(10), 1.0);
        assert_eq!(cpu_for_endpoints(3), 0.5);
        assert_eq!(cpu_for_endpoints(-1), 0.5);
    }

    #[test]
    fn test_custom_bands() {
        let bands = Bands {
            bands: &[(10, "big"), (5, "medium")],
            floor: "small",
        };
        assert_eq!(bands.lookup(11), "big");
        assert_eq!(bands.lookup(5), "medium");
        assert_eq!(bands.lookup(4), "small");
    }
}
