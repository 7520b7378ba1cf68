//! Security universe.
//!
//! The security list assigns every code a display name and an industry; the
//! industry decides the directory its record file lives in.

pub mod stock_list;

pub use stock_list::{Listing, StockList, UNKNOWN};

use vesta_data::SecurityCode;

/// Trait for security universes.
pub trait Universe {
    /// All codes in the universe.
    fn codes(&self) -> Vec<SecurityCode>;

    /// Check if a code is in the universe.
    fn contains(&self, code: &SecurityCode) -> bool {
        self.codes().contains(code)
    }

    /// Get the number of securities.
    fn size(&self) -> usize {
        self.codes().len()
    }
}

impl Universe for StockList {
    fn codes(&self) -> Vec<SecurityCode> {
        self.exchange_listings().map(|l| l.code.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_trait() {
        let list = StockList::from_reader(
            "code,name,industry\n600519.SH,贵州茅台,食品饮料\n430047.BJ,诺思兰德,医药生物\n".as_bytes(),
        )
        .unwrap();

        assert!(list.contains(&SecurityCode::parse("600519").unwrap()));
        assert!(!list.contains(&SecurityCode::parse("430047").unwrap()));
        assert_eq!(list.size(), 1);
    }
}
