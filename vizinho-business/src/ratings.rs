/// Running-mean rating kept on each business.
///
/// Unreviewed businesses carry a rating of 0.0 with a count of 0, rendered by
/// clients as "no ratings yet". The first review replaces the zero entirely
/// because the count is 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusinessRating {
    pub average: f64,
    pub count: i32,
}

impl Default for BusinessRating {
    fn default() -> Self {
        Self { average: 0.0, count: 0 }
    }
}

impl BusinessRating {
    pub fn new(average: f64, count: i32) -> Self {
        Self { average, count }
    }

    /// Fold one more review into the aggregate.
    pub fn apply(self, rating: i32) -> Self {
        let old_count = self.count.max(0) as f64;
        Self {
            average: (self.average * old_count + f64::from(rating)) / (old_count + 1.0),
            count: self.count + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn first_review_sets_the_average() {
        let agg = BusinessRating::default().apply(3);
        assert!((agg.average - 3.0).abs() < EPS);
        assert_eq!(agg.count, 1);
    }

    #[test]
    fn running_mean_matches_true_mean() {
        let ratings = [5, 4, 4, 2, 5, 1, 3];
        let mut agg = BusinessRating::default();
        for r in ratings {
            agg = agg.apply(r);
        }
        let expected = ratings.iter().sum::<i32>() as f64 / ratings.len() as f64;
        assert!((agg.average - expected).abs() < EPS);
        assert_eq!(agg.count, ratings.len() as i32);
    }

    #[test]
    fn unreviewed_business_reads_as_zero() {
        let agg = BusinessRating::default();
        assert_eq!(agg.count, 0);
        assert!(agg.average.abs() < EPS);
    }

    #[test]
    fn negative_count_is_treated_as_zero() {
        let agg = BusinessRating::new(4.0, -2).apply(5);
        assert!((agg.average - 5.0).abs() < EPS);
    }
}
