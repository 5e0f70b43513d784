//! Expression-based filtering for PSG data
//!
//! Predicates are trees of comparisons between numeric operands (columns,
//! literals, scaled columns and column sums), text membership and null
//! checks, combined with AND.
//! They are evaluated column-wise with Arrow compute kernels. A comparison
//! involving a null operand is null, and null rows are dropped when the
//! result is used as a filter mask.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, BooleanArray, Float64Array};
use arrow::compute::kernels::cmp::{eq, gt_eq, lt};
use arrow::compute::kernels::numeric::{add, mul};
use arrow::compute::{and, cast, is_not_null};
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::filter::core::{BatchFilter, filter_record_batch};
use crate::filter::error::{FilterResultExt, column_not_found};
use crate::schema::to_float64;

/// A numeric value computed per row
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Value of a column, read as `Float64`
    Column(String),

    /// Constant value
    Literal(f64),

    /// Constant factor times an operand
    Scaled(f64, Box<Operand>),

    /// Sum of operands
    Sum(Vec<Operand>),
}

impl Operand {
    /// Reference a column by name
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Multiply this operand by a constant
    #[must_use]
    pub fn times(self, factor: f64) -> Self {
        Self::Scaled(factor, Box::new(self))
    }

    /// Add another operand to this one
    #[must_use]
    pub fn plus(self, other: impl Into<Self>) -> Self {
        match self {
            Self::Sum(mut terms) => {
                terms.push(other.into());
                Self::Sum(terms)
            }
            first => Self::Sum(vec![first, other.into()]),
        }
    }

    fn collect_required_columns(&self, columns: &mut HashSet<String>) {
        match self {
            Self::Column(name) => {
                columns.insert(name.clone());
            }
            Self::Literal(_) => {}
            Self::Scaled(_, inner) => inner.collect_required_columns(columns),
            Self::Sum(terms) => {
                for term in terms {
                    term.collect_required_columns(columns);
                }
            }
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Self::Column(name.to_string())
    }
}

/// Represents a filter expression over PSG data
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Left operand equals right operand
    Eq(Operand, Operand),

    /// Left operand is greater than or equal to right operand
    GtEq(Operand, Operand),

    /// Left operand is less than right operand
    Lt(Operand, Operand),

    /// Column value, read as text, is one of the given values
    In(String, Vec<String>),

    /// Column is not null
    IsNotNull(String),

    /// Logical AND of expressions
    And(Vec<Expr>),
}

impl Expr {
    /// `lhs >= rhs`
    pub fn gt_eq(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::GtEq(lhs.into(), rhs.into())
    }

    /// `lhs < rhs`
    pub fn lt(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::Lt(lhs.into(), rhs.into())
    }

    /// Returns a set of all column names required by this expression
    #[must_use]
    pub fn required_columns(&self) -> HashSet<String> {
        let mut columns = HashSet::new();
        self.collect_required_columns(&mut columns);
        columns
    }

    fn collect_required_columns(&self, columns: &mut HashSet<String>) {
        match self {
            Self::Eq(lhs, rhs) | Self::GtEq(lhs, rhs) | Self::Lt(lhs, rhs) => {
                lhs.collect_required_columns(columns);
                rhs.collect_required_columns(columns);
            }
            Self::In(col, _) | Self::IsNotNull(col) => {
                columns.insert(col.clone());
            }
            Self::And(exprs) => {
                for expr in exprs {
                    expr.collect_required_columns(columns);
                }
            }
        }
    }
}

/// Evaluates a filter expression against a record batch
///
/// # Returns
/// A boolean array with one entry per row; null where an operand was null
///
/// # Errors
/// Returns an error if a referenced column is absent or a kernel fails
pub fn evaluate_expr(batch: &RecordBatch, expr: &Expr) -> Result<BooleanArray> {
    match expr {
        Expr::Eq(lhs, rhs) => compare(batch, lhs, rhs, |l, r| eq(l, r)),
        Expr::GtEq(lhs, rhs) => compare(batch, lhs, rhs, |l, r| gt_eq(l, r)),
        Expr::Lt(lhs, rhs) => compare(batch, lhs, rhs, |l, r| lt(l, r)),

        Expr::In(col_name, values) => evaluate_in_expression(batch, col_name, values),

        Expr::IsNotNull(col_name) => {
            let column = column_by_name(batch, col_name)?;
            is_not_null(column.as_ref()).with_column_context(col_name)
        }

        Expr::And(exprs) => {
            let mut result = BooleanArray::from(vec![true; batch.num_rows()]);
            for expr in exprs {
                let mask = evaluate_expr(batch, expr)?;
                result = and(&result, &mask)
                    .with_filter_context("Failed to apply AND operation to filter arrays")?;
            }
            Ok(result)
        }
    }
}

/// Evaluates an operand to one `Float64` value per row
pub fn evaluate_operand(batch: &RecordBatch, operand: &Operand) -> Result<Float64Array> {
    let rows = batch.num_rows();
    match operand {
        Operand::Column(name) => to_float64(column_by_name(batch, name)?),
        Operand::Literal(value) => Ok(Float64Array::from(vec![*value; rows])),
        Operand::Scaled(factor, inner) => {
            let values = evaluate_operand(batch, inner)?;
            let factor = Float64Array::from(vec![*factor; rows]);
            let product = mul(&factor, &values).with_filter_context("Failed to scale operand")?;
            Ok(product.as_primitive::<Float64Type>().clone())
        }
        Operand::Sum(terms) => {
            let mut total = Float64Array::from(vec![0.0; rows]);
            for term in terms {
                let values = evaluate_operand(batch, term)?;
                let sum = add(&total, &values).with_filter_context("Failed to add operands")?;
                total = sum.as_primitive::<Float64Type>().clone();
            }
            Ok(total)
        }
    }
}

fn compare<F>(batch: &RecordBatch, lhs: &Operand, rhs: &Operand, kernel: F) -> Result<BooleanArray>
where
    F: Fn(&Float64Array, &Float64Array) -> std::result::Result<BooleanArray, arrow::error::ArrowError>,
{
    let left = evaluate_operand(batch, lhs)?;
    let right = evaluate_operand(batch, rhs)?;
    kernel(&left, &right).with_filter_context("Failed to compare operands")
}

fn evaluate_in_expression(
    batch: &RecordBatch,
    col_name: &str,
    values: &[String],
) -> Result<BooleanArray> {
    let column = column_by_name(batch, col_name)?;
    let text = cast(column.as_ref(), &DataType::Utf8).with_column_context(col_name)?;
    let allowed: HashSet<&str> = values.iter().map(String::as_str).collect();

    Ok(text
        .as_string::<i32>()
        .iter()
        .map(|value| Some(value.is_some_and(|v| allowed.contains(v))))
        .collect())
}

fn column_by_name<'a>(batch: &'a RecordBatch, col_name: &str) -> Result<&'a ArrayRef> {
    match batch.schema().index_of(col_name) {
        Ok(idx) => Ok(batch.column(idx)),
        Err(_) => column_not_found(col_name),
    }
}

/// A filter that evaluates an expression against a record batch
#[derive(Debug, Clone)]
pub struct ExpressionFilter {
    expr: Expr,
}

impl ExpressionFilter {
    /// Create a new expression filter
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }
}

impl BatchFilter for ExpressionFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mask = evaluate_expr(batch, &self.expr)?;
        filter_record_batch(batch, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        self.expr.required_columns()
    }
}

/// Wrap an expression as a shareable filter
#[must_use]
pub fn expr_to_filter(expr: &Expr) -> Arc<dyn BatchFilter + Send + Sync> {
    Arc::new(ExpressionFilter::new(expr.clone()))
}
