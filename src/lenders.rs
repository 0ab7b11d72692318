use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::money::Money;

/// one lender's line on a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderDetail {
    pub lender_id: String,
    /// principal plus priced interest owed to this lender
    pub amount: Money,
    pub repaid: Money,
}

impl LenderDetail {
    pub fn new(lender_id: impl Into<String>, amount: Money) -> Self {
        Self {
            lender_id: lender_id.into(),
            amount,
            repaid: Money::ZERO,
        }
    }

    /// amount still owed to this lender
    pub fn outstanding(&self) -> Money {
        self.amount.saturating_sub(self.repaid)
    }

    pub fn is_settled(&self) -> bool {
        self.repaid >= self.amount
    }
}

/// Lender lines of a loan keyed by lender id.
///
/// Lines keep first-funding order; lookups go through an index so upserts
/// do not scan. Serialized as a plain ordered list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<LenderDetail>", into = "Vec<LenderDetail>")]
pub struct LenderBook {
    lines: Vec<LenderDetail>,
    index: HashMap<String, usize>,
}

impl LenderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, lender_id: &str) -> Option<&LenderDetail> {
        self.index.get(lender_id).map(|&i| &self.lines[i])
    }

    pub fn get_mut(&mut self, lender_id: &str) -> Option<&mut LenderDetail> {
        match self.index.get(lender_id) {
            Some(&i) => self.lines.get_mut(i),
            None => None,
        }
    }

    /// Adds `amount` to the lender's line, appending a new line on first
    /// funding. Returns `None` if the line total would overflow.
    pub fn credit(&mut self, lender_id: &str, amount: Money) -> Option<&LenderDetail> {
        match self.index.get(lender_id) {
            Some(&i) => {
                let line = &mut self.lines[i];
                line.amount = line.amount.checked_add(amount)?;
                Some(&self.lines[i])
            }
            None => {
                self.index.insert(lender_id.to_string(), self.lines.len());
                self.lines.push(LenderDetail::new(lender_id, amount));
                self.lines.last()
            }
        }
    }

    /// lines in first-funding order
    pub fn iter(&self) -> impl Iterator<Item = &LenderDetail> {
        self.lines.iter()
    }

    /// sum of every line's amount; `None` on overflow
    pub fn total_owed(&self) -> Option<Money> {
        Money::checked_sum(self.lines.iter().map(|l| l.amount))
    }

    pub fn total_repaid(&self) -> Option<Money> {
        Money::checked_sum(self.lines.iter().map(|l| l.repaid))
    }
}

impl PartialEq for LenderBook {
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl Eq for LenderBook {}

impl From<Vec<LenderDetail>> for LenderBook {
    fn from(details: Vec<LenderDetail>) -> Self {
        let mut book = LenderBook::new();
        for detail in details {
            match book.index.get(&detail.lender_id) {
                // duplicate lines fold into the first one
                Some(&i) => {
                    let line = &mut book.lines[i];
                    line.amount = line.amount.saturating_add(detail.amount);
                    line.repaid = line.repaid.saturating_add(detail.repaid);
                }
                None => {
                    book.index.insert(detail.lender_id.clone(), book.lines.len());
                    book.lines.push(detail);
                }
            }
        }
        book
    }
}

impl From<LenderBook> for Vec<LenderDetail> {
    fn from(book: LenderBook) -> Self {
        book.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_appends_then_accumulates() {
        let mut book = LenderBook::new();
        book.credit("l1", Money::new(600));
        book.credit("l2", Money::new(300));
        book.credit("l1", Money::new(100));

        assert_eq!(book.len(), 2);
        assert_eq!(book.get("l1").unwrap().amount, Money::new(700));
        assert_eq!(book.get("l2").unwrap().amount, Money::new(300));
        assert!(book.get("l3").is_none());
        assert_eq!(book.total_owed(), Some(Money::new(1000)));
    }

    #[test]
    fn test_first_funding_order_is_kept() {
        let mut book = LenderBook::new();
        for id in ["l3", "l1", "l2", "l1"] {
            book.credit(id, Money::new(100));
        }
        let order: Vec<&str> = book.iter().map(|l| l.lender_id.as_str()).collect();
        assert_eq!(order, vec!["l3", "l1", "l2"]);
    }

    #[test]
    fn test_serializes_as_ordered_list() {
        let mut book = LenderBook::new();
        book.credit("l2", Money::new(400));
        book.credit("l1", Money::new(600));
        book.get_mut("l1").unwrap().repaid = Money::new(100);

        let json = serde_json::to_string(&book).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&json).unwrap(),
            serde_json::json!([
                {"lender_id": "l2", "amount": 400, "repaid": 0},
                {"lender_id": "l1", "amount": 600, "repaid": 100},
            ])
        );

        let back: LenderBook = serde_json::from_str(&json).unwrap();
        assert_eq!(back, book);
        assert_eq!(back.get("l1").unwrap().outstanding(), Money::new(500));
    }

    #[test]
    fn test_duplicate_lines_are_merged_on_load() {
        let book = LenderBook::from(vec![
            LenderDetail::new("l1", Money::new(100)),
            LenderDetail::new("l1", Money::new(200)),
        ]);
        assert_eq!(book.len(), 1);
        assert_eq!(book.get("l1").unwrap().amount, Money::new(300));
    }
}
