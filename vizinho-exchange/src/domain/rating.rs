/// Running-mean rating aggregate kept on each user, per role.
///
/// New users start at 5.0 with a count of 0; the first review replaces the
/// default entirely because the count is 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: i32,
}

impl Default for RatingAggregate {
    fn default() -> Self {
        Self { average: 5.0, count: 0 }
    }
}

impl RatingAggregate {
    pub fn new(average: f64, count: i32) -> Self {
        Self { average, count }
    }

    /// Fold one more rating into the aggregate.
    pub fn apply(self, rating: i32) -> Self {
        Self {
            average: next_rating(self.average, self.count, rating),
            count: self.count + 1,
        }
    }
}

/// Incremental mean: `(old_avg * old_count + rating) / (old_count + 1)`.
pub fn next_rating(old_avg: f64, old_count: i32, rating: i32) -> f64 {
    let old_count = old_count.max(0) as f64;
    (old_avg * old_count + f64::from(rating)) / (old_count + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn first_review_replaces_the_default() {
        let agg = RatingAggregate::default().apply(4);
        assert!((agg.average - 4.0).abs() < EPS);
        assert_eq!(agg.count, 1);
    }

    #[test]
    fn running_mean_equals_true_mean() {
        let ratings = [3, 5, 1, 4, 4, 2, 5, 5, 3, 1];
        let mut agg = RatingAggregate::default();
        for r in ratings {
            agg = agg.apply(r);
        }
        let expected = ratings.iter().sum::<i32>() as f64 / ratings.len() as f64;
        assert!((agg.average - expected).abs() < EPS);
        assert_eq!(agg.count, ratings.len() as i32);
    }

    #[test]
    fn running_mean_is_order_independent() {
        let ratings = [5, 1, 3, 2, 4];
        let forward = ratings
            .iter()
            .fold(RatingAggregate::default(), |a, &r| a.apply(r));
        let backward = ratings
            .iter()
            .rev()
            .fold(RatingAggregate::default(), |a, &r| a.apply(r));
        assert!((forward.average - backward.average).abs() < EPS);
    }

    #[test]
    fn negative_count_is_treated_as_zero() {
        // A corrupted counter must not poison the mean.
        assert!((next_rating(5.0, -3, 2) - 2.0).abs() < EPS);
    }
}
