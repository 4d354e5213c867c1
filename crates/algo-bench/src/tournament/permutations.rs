/// Generates deterministic seat permutations for `seats`-player games.
pub struct SeatPermutations {
    permutations: Vec<Vec<usize>>,
}

impl SeatPermutations {
    pub fn new(seats: usize, count: usize) -> Self {
        let limit = count.min(factorial(seats));
        let mut permutations = Vec::with_capacity(limit);
        let mut base: Vec<usize> = (0..seats).collect();
        generate(&mut base, 0, limit, &mut permutations);
        Self { permutations }
    }

    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.permutations
    }
}

/// Number of distinct seatings; saturates instead of overflowing.
pub fn factorial(n: usize) -> usize {
    (1..=n).fold(1usize, |acc, k| acc.saturating_mul(k))
}

fn generate(data: &mut [usize], start: usize, limit: usize, output: &mut Vec<Vec<usize>>) {
    if output.len() >= limit {
        return;
    }

    if start + 1 >= data.len() {
        output.push(data.to_vec());
        return;
    }

    for idx in start..data.len() {
        data.swap(start, idx);
        generate(data, start + 1, limit, output);
        data.swap(start, idx);
        if output.len() >= limit {
            break;
        }
    }
}
