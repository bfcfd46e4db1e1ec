//! Pipeline Parser
//!
//! Parses the pipeline text emitted by [`Select::compile`](super::Select::compile)
//! back into a structured form, so stores without a native query engine can
//! execute textual queries.
//!
//! # Supported Syntax
//!
//! ```text
//! from(bucket: "<name>")
//!   [|> range(start: -<n><unit>)]
//!   [|> filter(fn: (r) => r.<column> <op> <literal>)]*
//! ```
//!
//! Literals may be double-quoted strings or bare numbers/booleans. `=` and
//! `==` both read as equality.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, map_res, recognize},
    multi::many0,
    sequence::{pair, preceded},
    IResult,
};

use crate::schema::{FieldKind, Value};

use super::ast::{Operator, Predicate};
use super::error::{QueryError, QueryResult};
use super::range::RelativeRange;
use super::select::QueryPlan;

/// A parsed pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct FluxPipeline {
    /// Bucket named in `from(...)`
    pub bucket: String,
    /// Range start, if a range stage is present
    pub range: Option<RelativeRange>,
    /// Filter stages in order
    pub filters: Vec<FluxFilter>,
}

/// One `filter(fn: (r) => r.col op literal)` stage
#[derive(Debug, Clone, PartialEq)]
pub struct FluxFilter {
    pub column: String,
    pub op: Operator,
    pub literal: Value,
}

impl FluxPipeline {
    /// Convert into a query plan, typing each literal after its column.
    ///
    /// Columns `kind_of` doesn't know keep the literal's own kind. A missing
    /// range stage means the default range.
    pub fn to_plan<F>(&self, kind_of: F) -> QueryPlan
    where
        F: Fn(&str) -> Option<FieldKind>,
    {
        let predicates = self
            .filters
            .iter()
            .map(|f| {
                let kind = kind_of(&f.column).unwrap_or_else(|| f.literal.kind());
                Predicate::new(f.column.clone(), kind, f.op, f.literal.clone())
            })
            .collect();

        QueryPlan {
            bucket: self.bucket.clone(),
            range: self.range.unwrap_or_default(),
            predicates,
        }
    }
}

enum Stage {
    Range(RelativeRange),
    Filter(FluxFilter),
}

/// Parse pipeline text
pub fn parse_pipeline(input: &str) -> QueryResult<FluxPipeline> {
    match parse_full_pipeline(input) {
        Ok((remaining, pipeline)) => {
            if remaining.trim().is_empty() {
                Ok(pipeline)
            } else {
                Err(QueryError::Parse(format!(
                    "Unexpected input after pipeline: '{}'",
                    remaining.trim()
                )))
            }
        }
        Err(e) => Err(QueryError::Parse(format!("{:?}", e))),
    }
}

fn parse_full_pipeline(input: &str) -> IResult<&str, FluxPipeline> {
    let (input, _) = multispace0(input)?;
    let (input, bucket) = parse_from(input)?;
    let (input, stages) = many0(preceded(
        pair(multispace0, tag("|>")),
        preceded(multispace0, parse_stage),
    ))(input)?;
    let (input, _) = multispace0(input)?;

    let mut range = None;
    let mut filters = Vec::new();
    for stage in stages {
        match stage {
            Stage::Range(r) => range = Some(r),
            Stage::Filter(f) => filters.push(f),
        }
    }

    Ok((
        input,
        FluxPipeline {
            bucket,
            range,
            filters,
        },
    ))
}

/// Parse `from(bucket: "<name>")`
fn parse_from(input: &str) -> IResult<&str, String> {
    let (input, _) = tag("from")(input)?;
    let (input, _) = open_paren(input)?;
    let (input, _) = keyword_arg("bucket", input)?;
    let (input, bucket) = parse_string_literal(input)?;
    let (input, _) = close_paren(input)?;
    Ok((input, bucket))
}

fn parse_stage(input: &str) -> IResult<&str, Stage> {
    alt((
        map(parse_range, Stage::Range),
        map(parse_filter, Stage::Filter),
    ))(input)
}

/// Parse `range(start: -1h)`
fn parse_range(input: &str) -> IResult<&str, RelativeRange> {
    let (input, _) = tag("range")(input)?;
    let (input, _) = open_paren(input)?;
    let (input, _) = keyword_arg("start", input)?;
    let (input, range) = map_res(
        recognize(pair(char('-'), take_while1(|c: char| c.is_ascii_alphanumeric()))),
        RelativeRange::parse,
    )(input)?;
    let (input, _) = close_paren(input)?;
    Ok((input, range))
}

/// Parse `filter(fn: (r) => r.<column> <op> <literal>)`
fn parse_filter(input: &str) -> IResult<&str, FluxFilter> {
    let (input, _) = tag("filter")(input)?;
    let (input, _) = open_paren(input)?;
    let (input, _) = keyword_arg("fn", input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('r')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = tag("=>")(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = tag("r.")(input)?;
    let (input, column) = parse_identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, op) = parse_operator(input)?;
    let (input, _) = multispace0(input)?;
    let (input, literal) = parse_literal(input)?;
    let (input, _) = close_paren(input)?;

    Ok((
        input,
        FluxFilter {
            column: column.to_string(),
            op,
            literal,
        },
    ))
}

fn open_paren(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn close_paren(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, ()))
}

/// Parse `<name>:` with surrounding whitespace
fn keyword_arg<'a>(name: &'static str, input: &'a str) -> IResult<&'a str, ()> {
    let (input, _) = tag(name)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(':')(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn parse_operator(input: &str) -> IResult<&str, Operator> {
    map_res(
        alt((
            tag("<="),
            tag(">="),
            tag("=="),
            tag("!="),
            tag("<"),
            tag(">"),
            tag("="),
        )),
        Operator::from_symbol,
    )(input)
}

fn parse_literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(parse_string_literal, Value::String),
        map(
            take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')),
            bare_literal,
        ),
    ))(input)
}

fn bare_literal(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(f) = s.parse::<f64>() {
        Value::Float(f)
    } else if s == "true" || s == "false" {
        Value::Boolean(s == "true")
    } else {
        Value::String(s.to_string())
    }
}

/// Parse a double-quoted string, resolving `\"`, `\\` and `\n`
fn parse_string_literal(input: &str) -> IResult<&str, String> {
    let (rest, _) = char('"')(input)?;
    let mut out = String::new();
    let mut chars = rest.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((&rest[i + 1..], out)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            other => out.push(other),
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}
