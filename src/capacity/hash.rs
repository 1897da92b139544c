//! Server-name hash table sizing.

use serde::Serialize;

use crate::model::Server;

/// Bucket and key-space sizes for the server-name hash table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HashSizing {
    /// Must hold the longest hostname.
    pub bucket_size: usize,
    /// Must hold the sum of all hostnames.
    pub max_size: usize,
}

impl HashSizing {
    pub fn new(bucket_size: usize, max_size: usize) -> Self {
        Self {
            bucket_size,
            max_size,
        }
    }

    /// Element-wise maximum of `self` and `floor`.
    pub fn raise_floor(self, floor: HashSizing) -> HashSizing {
        if self.bucket_size > floor.bucket_size {
            tracing::debug!(
                from = floor.bucket_size,
                to = self.bucket_size,
                "Adjusting server name hash bucket size"
            );
        }
        if self.max_size > floor.max_size {
            tracing::debug!(
                from = floor.max_size,
                to = self.max_size,
                "Adjusting server name hash max size"
            );
        }

        HashSizing {
            bucket_size: self.bucket_size.max(floor.bucket_size),
            max_size: self.max_size.max(floor.max_size),
        }
    }
}

/// Smallest power of two greater than or equal to `n`; 1 for `n <= 1`.
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Compute the hash sizing needed for the given servers.
pub fn compute_sizing(servers: &[Server]) -> HashSizing {
    let mut longest = 0;
    let mut total = 0usize;
    for server in servers {
        let len = server.hostname.len();
        longest = longest.max(len);
        total = total.saturating_add(len);
    }

    HashSizing {
        bucket_size: next_power_of_two(longest),
        max_size: next_power_of_two(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(8), 8);
        assert_eq!(next_power_of_two(9), 16);
        assert_eq!(next_power_of_two(1000), 1024);
    }

    #[test]
    fn power_of_two_is_minimal() {
        for n in 2..2048usize {
            let p = next_power_of_two(n);
            assert!(p.is_power_of_two());
            assert!(p >= n);
            assert!(p / 2 < n, "{} is not the smallest power for {}", p, n);
        }
    }

    #[test]
    fn no_servers_sizes_to_one() {
        assert_eq!(compute_sizing(&[]), HashSizing::new(1, 1));
    }

    #[test]
    fn sizes_from_longest_and_total_hostnames() {
        let long = "averyveryverylonghostname.example.com";
        let servers = vec![Server::new("a.com"), Server::new(long)];

        let sizing = compute_sizing(&servers);
        assert_eq!(sizing.bucket_size, next_power_of_two(long.len()));
        assert_eq!(sizing.max_size, next_power_of_two("a.com".len() + long.len()));
        assert_eq!(sizing, HashSizing::new(64, 64));
    }

    #[test]
    fn hostname_length_is_counted_in_bytes() {
        let servers = vec![Server::new("bücher.example")];
        assert_eq!(compute_sizing(&servers).bucket_size, 16);
    }

    #[test]
    fn floor_wins_over_smaller_computed_value() {
        let computed = HashSizing::new(32, 128);
        let raised = computed.raise_floor(HashSizing::new(64, 64));
        assert_eq!(raised, HashSizing::new(64, 128));
    }
}
