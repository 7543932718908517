//! Text formats: the model file and the training definitions file.
//!
//! A model file looks like
//! ```text
//! % comment
//! N=2;
//! M=4;
//! p=[5.0e-1,5.0e-1];
//! q=[5.0e-1,5.0e-1];
//! a=[[9.0e-1,1.0e-1];
//!    [1.0e-1,9.0e-1];];
//! b=[[8.0e-1,6.7e-2,6.7e-2,6.7e-2];
//!    [6.7e-2,8.0e-1,6.7e-2,6.7e-2];];
//! ```
//! with linear probabilities. `N` and `M` should come before the arrays, and
//! an optional `ORDER=1;` is accepted. A definitions file holds the lists
//! `learn_a`, `learn_b`, `learn_p`, `learn_q`, `const_a`, `const_b`, `const_p`, and `const_q`,
//! each optionally terminated by an entry starting with `-1`.
use crate::error::{Error, Result};
use crate::logspace::{finite_or_sentinel, log, ALMOST_NEG_INFTY};
use crate::mask::TrainingMask;
use crate::model::{Model, ModelConfig, Parameters};
use std::io::{Read, Write};
use std::iter::Peekable;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Equal,
    Comma,
    Semicolon,
    Open,
    Close,
}

fn take_word<I: Iterator<Item = char>>(chars: &mut Peekable<I>, accept: fn(char) -> bool) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if !accept(c) {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = vec![];
    let mut line = 1;
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        let token = match c {
            '\n' => {
                line += 1;
                chars.next();
                continue;
            }
            '%' => {
                take_word(&mut chars, |c| c != '\n');
                continue;
            }
            _ if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '=' => Token::Equal,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '[' => Token::Open,
            ']' => Token::Close,
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let word = take_word(&mut chars, |c| c.is_ascii_alphanumeric() || c == '_');
                tokens.push((Token::Ident(word), line));
                continue;
            }
            _ if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let word = take_word(&mut chars, |c| {
                    c.is_ascii_alphanumeric() || c == '-' || c == '+' || c == '.'
                });
                match word.parse::<f64>() {
                    Ok(x) => tokens.push((Token::Number(x), line)),
                    Err(_) => return Err(Error::parse(line, format!("\"{}\" is not a number", word))),
                }
                continue;
            }
            _ => return Err(Error::parse(line, format!("unexpected character '{}'", c))),
        };
        chars.next();
        tokens.push((token, line));
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(f64),
    List(Vec<Value>),
}

#[derive(Debug, Clone)]
struct Statement {
    name: String,
    value: Value,
    line: usize,
}

impl Statement {
    fn number(&self) -> Result<f64> {
        match &self.value {
            Value::Number(x) => Ok(*x),
            Value::List(_) => Err(self.error("a number expected")),
        }
    }
    fn count(&self) -> Result<usize> {
        match self.number()? {
            x if 0f64 <= x && x.fract() == 0f64 => Ok(x as usize),
            x => Err(self.error(format!("{} is not a non-negative integer", x))),
        }
    }
    fn list(&self) -> Result<&[Value]> {
        match &self.value {
            Value::List(xs) => Ok(xs),
            Value::Number(_) => Err(self.error("an array expected")),
        }
    }
    // A flat array of `len` numbers.
    fn numbers(&self, len: usize) -> Result<Vec<f64>> {
        let xs = self.list()?;
        if xs.len() != len {
            return Err(self.error(format!("{} values, expected {}", xs.len(), len)));
        }
        xs.iter()
            .map(|x| match x {
                Value::Number(x) => Ok(*x),
                Value::List(_) => Err(self.error("a number expected")),
            })
            .collect()
    }
    // `rows` arrays of `columns` numbers, flattened.
    fn matrix(&self, rows: usize, columns: usize) -> Result<Vec<f64>> {
        let xs = self.list()?;
        if xs.len() != rows {
            return Err(self.error(format!("{} rows, expected {}", xs.len(), rows)));
        }
        let mut flat = Vec::with_capacity(rows * columns);
        for row in xs.iter() {
            let row = match row {
                Value::List(row) if row.len() == columns => row,
                Value::List(row) => {
                    let msg = format!("{} columns, expected {}", row.len(), columns);
                    return Err(self.error(msg));
                }
                Value::Number(_) => return Err(self.error("an array expected")),
            };
            for x in row.iter() {
                match x {
                    Value::Number(x) => flat.push(*x),
                    Value::List(_) => return Err(self.error("a number expected")),
                }
            }
        }
        Ok(flat)
    }
    // Entries of a definitions list, up to the first one starting with a negative number.
    // Each entry is a number when `width` is 1 and an array of `width` numbers otherwise.
    fn entries(&self, width: usize) -> Result<Vec<Vec<f64>>> {
        let mut entries = vec![];
        for x in self.list()?.iter() {
            let entry: Vec<f64> = match (x, width) {
                (Value::Number(x), 1) => vec![*x],
                (Value::List(xs), _) => xs
                    .iter()
                    .map(|x| match x {
                        Value::Number(x) => Ok(*x),
                        Value::List(_) => Err(self.error("a number expected")),
                    })
                    .collect::<Result<_>>()?,
                _ => return Err(self.error(format!("an array of {} expected", width))),
            };
            if entry.first().map(|&x| x < 0f64).unwrap_or(false) {
                break;
            }
            if entry.len() != width {
                let msg = format!("{} elements, expected {}", entry.len(), width);
                return Err(self.error(msg));
            }
            entries.push(entry);
        }
        Ok(entries)
    }
    fn error<S: Into<String>>(&self, message: S) -> Error {
        Error::parse(self.line, format!("{}: {}", self.name, message.into()))
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        Ok(Self { tokens, pos: 0 })
    }
    fn line(&self) -> usize {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(&(_, line)) => line,
            None => 1,
        }
    }
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|x| &x.0)
    }
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|x| x.0.clone());
        self.pos += 1;
        token
    }
    fn expect(&mut self, expected: Token) -> Result<()> {
        let line = self.line();
        match self.next() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(Error::parse(line, format!("{:?} expected, found {:?}", expected, token))),
            None => Err(Error::parse(line, format!("{:?} expected, found the end", expected))),
        }
    }
    fn statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = vec![];
        loop {
            let line = self.line();
            let token = match self.next() {
                Some(token) => token,
                None => break,
            };
            let name = match token {
                Token::Ident(name) => name,
                // Stray separators between statements.
                Token::Semicolon => continue,
                token => return Err(Error::parse(line, format!("unexpected {:?}", token))),
            };
            self.expect(Token::Equal)?;
            let value = self.value()?;
            self.expect(Token::Semicolon)?;
            statements.push(Statement { name, value, line });
        }
        Ok(statements)
    }
    fn value(&mut self) -> Result<Value> {
        let line = self.line();
        match self.next() {
            Some(Token::Number(x)) => Ok(Value::Number(x)),
            Some(Token::Open) => {
                let mut items = vec![];
                loop {
                    match self.peek() {
                        Some(Token::Close) => {
                            self.next();
                            return Ok(Value::List(items));
                        }
                        Some(Token::Comma) | Some(Token::Semicolon) => {
                            self.next();
                        }
                        Some(_) => items.push(self.value()?),
                        None => return Err(Error::parse(line, "missing ']'")),
                    }
                }
            }
            Some(token) => Err(Error::parse(line, format!("unexpected {:?}", token))),
            None => Err(Error::parse(line, "unexpected end of input")),
        }
    }
}

fn log_error<T>(result: Result<T>) -> Result<T> {
    if let Err(why) = result.as_ref() {
        error!("{}", why);
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Space {
    Linear,
    Log,
}

fn parse_parameters(input: &str, space: Space) -> Result<Parameters> {
    let statements = Parser::new(input)?.statements()?;
    let (mut states, mut symbols) = (None, None);
    let (mut p, mut q, mut a, mut b) = (None, None, None, None);
    for st in statements.iter() {
        let defined = match st.name.as_str() {
            "N" => states.replace(st.count()?).is_some(),
            "M" => symbols.replace(st.count()?).is_some(),
            "ORDER" => match st.count()? {
                1 => false,
                order => return Err(st.error(format!("order {} is not supported", order))),
            },
            "p" | "q" | "a" | "b" => {
                let (n, m) = match (states, symbols) {
                    (Some(n), Some(m)) => (n, m),
                    _ => return Err(st.error("N and M should be defined first")),
                };
                let values = match st.name.as_str() {
                    "p" => p.replace(st.numbers(n)?),
                    "q" => q.replace(st.numbers(n)?),
                    "a" => a.replace(st.matrix(n, n)?),
                    _ => b.replace(st.matrix(n, m)?),
                };
                values.is_some()
            }
            _ => return Err(st.error("unknown key")),
        };
        if defined {
            return Err(st.error("double defined"));
        }
    }
    let missing = |what: &str| Error::parse(0, format!("{} is not defined", what));
    let states = states.ok_or_else(|| missing("N"))?;
    let symbols = symbols.ok_or_else(|| missing("M"))?;
    let mut tables = vec![];
    for (name, table) in vec![("p", p), ("q", q), ("a", a), ("b", b)] {
        let table = table.ok_or_else(|| missing(name))?;
        let table = table
            .into_iter()
            .map(|x| convert(x, space).ok_or_else(|| Error::invalid(format!("{}: {} is not a probability", name, x))))
            .collect::<Result<Vec<_>>>()?;
        tables.push(table);
    }
    let b = tables.pop().unwrap_or_default();
    let a = tables.pop().unwrap_or_default();
    let q = tables.pop().unwrap_or_default();
    let p = tables.pop().unwrap_or_default();
    Parameters::from_log_elements(states, symbols, p, q, a, b)
}

fn convert(x: f64, space: Space) -> Option<f64> {
    match space {
        Space::Linear if x.is_finite() && 0f64 <= x => Some(log(x)),
        Space::Log if x <= ALMOST_NEG_INFTY => Some(f64::NEG_INFINITY),
        Space::Log if x.is_finite() => Some(x),
        _ => None,
    }
}

/// Parse a model file with linear probabilities.
pub fn parse_model(input: &str, config: &ModelConfig) -> Result<Model> {
    let params = log_error(parse_parameters(input, Space::Linear))?;
    debug!("Parsed a model with {} states and {} symbols", params.states(), params.symbols());
    Ok(Model::new(params, config))
}

/// Parse a model file written by [`write_log_model`].
pub fn parse_log_model(input: &str, config: &ModelConfig) -> Result<Model> {
    let params = log_error(parse_parameters(input, Space::Log))?;
    Ok(Model::new(params, config))
}

/// Read a model file with linear probabilities.
pub fn read_model<R: Read>(mut reader: R, config: &ModelConfig) -> Result<Model> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    parse_model(&input, config)
}

pub fn load_model<P: AsRef<Path>>(path: P, config: &ModelConfig) -> Result<Model> {
    let file = std::fs::File::open(path)?;
    read_model(std::io::BufReader::new(file), config)
}

const MODEL_HEADER: &str = "% hidden Markov model
% N  - number of states
% M  - number of observation symbols
% a is the state transition matrix, size(a)= [N,N]
% b is the observation per state matrix, size(b)= [N,M]
% p is the initial distribution, size(p)= [1,N]
% q is the distribution of end states, size(q)= [1,N]
";

fn write_tables<W: Write, F: Fn(f64) -> f64>(wtr: &mut W, model: &Model, f: F) -> Result<()> {
    let params = model.parameters();
    let join = |xs: &[f64]| -> String {
        let xs: Vec<_> = xs.iter().map(|&x| format!("{:.5e}", f(x))).collect();
        xs.join(",")
    };
    writeln!(wtr, "{}", MODEL_HEADER)?;
    writeln!(wtr, "N={};", model.states())?;
    writeln!(wtr, "M={};", model.symbols())?;
    writeln!(wtr, "p=[{}];\n", join(params.initial_distribution()))?;
    writeln!(wtr, "q=[{}];\n", join(params.terminal_distribution()))?;
    writeln!(wtr, "a=[")?;
    for i in 0..model.states() {
        writeln!(wtr, "\t[{}];", join(params.transitions(i)))?;
    }
    writeln!(wtr, "  ];\n\nb=[")?;
    for i in 0..model.states() {
        writeln!(wtr, "\t[{}];", join(params.emissions(i)))?;
    }
    writeln!(wtr, "  ];")?;
    Ok(())
}

/// Write the model with linear probabilities and six significant digits.
pub fn write_model<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    write_tables(wtr, model, f64::exp)
}

/// Write the model with log probabilities. Zero probabilities become [`ALMOST_NEG_INFTY`].
pub fn write_log_model<W: Write>(wtr: &mut W, model: &Model) -> Result<()> {
    write_tables(wtr, model, finite_or_sentinel)
}

pub fn save_model<P: AsRef<Path>>(path: P, model: &Model) -> Result<()> {
    let mut wtr = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_model(&mut wtr, model)?;
    wtr.flush()?;
    Ok(())
}

/// Parse a definitions file into a training mask.
pub fn parse_definitions(input: &str) -> Result<TrainingMask> {
    log_error(parse_mask(input))
}

fn parse_mask(input: &str) -> Result<TrainingMask> {
    let statements = Parser::new(input)?.statements()?;
    let mut lists: [Option<Vec<Vec<f64>>>; 8] = Default::default();
    const KEYS: [(&str, usize); 8] = [
        ("learn_a", 2),
        ("learn_b", 2),
        ("learn_p", 1),
        ("learn_q", 1),
        ("const_a", 3),
        ("const_b", 3),
        ("const_p", 2),
        ("const_q", 2),
    ];
    for st in statements.iter() {
        let idx = match KEYS.iter().position(|&(key, _)| key == st.name) {
            Some(idx) => idx,
            None => return Err(st.error("unknown key")),
        };
        let entries = st.entries(KEYS[idx].1)?;
        for entry in entries.iter() {
            let width = match idx {
                0..=3 => entry.len(),
                _ => entry.len() - 1,
            };
            if let Some(x) = entry[..width].iter().find(|x| x.fract() != 0f64 || x.is_sign_negative()) {
                return Err(st.error(format!("{} is not an index", x)));
            }
        }
        if lists[idx].replace(entries).is_some() {
            return Err(st.error("double defined"));
        }
    }
    let [learn_a, learn_b, learn_p, learn_q, const_a, const_b, const_p, const_q] = lists;
    let pairs = |xs: Option<Vec<Vec<f64>>>| -> Vec<(usize, usize)> {
        xs.unwrap_or_default()
            .iter()
            .map(|x| (x[0] as usize, x[1] as usize))
            .collect()
    };
    let singles = |xs: Option<Vec<Vec<f64>>>| -> Vec<usize> {
        xs.unwrap_or_default().iter().map(|x| x[0] as usize).collect()
    };
    let triples = |xs: Option<Vec<Vec<f64>>>| -> Vec<(usize, usize, f64)> {
        xs.unwrap_or_default()
            .iter()
            .map(|x| (x[0] as usize, x[1] as usize, x[2]))
            .collect()
    };
    let values = |xs: Option<Vec<Vec<f64>>>| -> Vec<(usize, f64)> {
        xs.unwrap_or_default()
            .iter()
            .map(|x| (x[0] as usize, x[1]))
            .collect()
    };
    Ok(TrainingMask::from_raw_elements(
        pairs(learn_a),
        pairs(learn_b),
        singles(learn_p),
        singles(learn_q),
        triples(const_a),
        triples(const_b),
        values(const_p),
        values(const_q),
    ))
}

pub fn load_definitions<P: AsRef<Path>>(path: P) -> Result<TrainingMask> {
    let input = std::fs::read_to_string(path)?;
    parse_definitions(&input)
}

fn sep(empty: bool, s: &'static str) -> &'static str {
    if empty {
        ""
    } else {
        s
    }
}

/// Write a training mask in the definitions format, with `-1` terminators.
pub fn write_definitions<W: Write>(wtr: &mut W, mask: &TrainingMask) -> Result<()> {
    let pairs = |xs: &[(usize, usize)]| -> String {
        let xs: Vec<_> = xs.iter().map(|(i, j)| format!("[{},{}]", i, j)).collect();
        xs.join(";")
    };
    let singles = |xs: &[usize]| -> String {
        let xs: Vec<_> = xs.iter().map(|i| format!("{}", i)).collect();
        xs.join(",")
    };
    let triples = |xs: &[(usize, usize, f64)]| -> String {
        let xs: Vec<_> = xs.iter().map(|(i, j, v)| format!("[{},{},{}]", i, j, v)).collect();
        xs.join(";")
    };
    let values = |xs: &[(usize, f64)]| -> String {
        let xs: Vec<_> = xs.iter().map(|(i, v)| format!("[{},{}]", i, v)).collect();
        xs.join(";")
    };
    let (la, lb) = (mask.learn_a(), mask.learn_b());
    writeln!(wtr, "learn_a=[{}{}[-1,-1]];", pairs(la), sep(la.is_empty(), ";"))?;
    writeln!(wtr, "learn_b=[{}{}[-1,-1]];", pairs(lb), sep(lb.is_empty(), ";"))?;
    let (lp, lq) = (mask.learn_p(), mask.learn_q());
    writeln!(wtr, "learn_p=[{}{}-1];", singles(lp), sep(lp.is_empty(), ","))?;
    writeln!(wtr, "learn_q=[{}{}-1];", singles(lq), sep(lq.is_empty(), ","))?;
    let (ca, cb) = (mask.const_a(), mask.const_b());
    writeln!(wtr, "const_a=[{}{}[-1,-1,-1]];", triples(ca), sep(ca.is_empty(), ";"))?;
    writeln!(wtr, "const_b=[{}{}[-1,-1,-1]];", triples(cb), sep(cb.is_empty(), ";"))?;
    let (cp, cq) = (mask.const_p(), mask.const_q());
    writeln!(wtr, "const_p=[{}{}[-1,-1]];", values(cp), sep(cp.is_empty(), ";"))?;
    writeln!(wtr, "const_q=[{}{}[-1,-1]];", values(cq), sep(cq.is_empty(), ";"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::tests::sticky_model;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    const STICKY: &str = "% two sticky states
N=2;
M=4;
ORDER=1;
p=[0.5, 0.5];
q=[0.5 0.5];
a=[[0.9,0.1];
   [0.1,0.9];];
b=[[0.8,0.0666666666666667,0.0666666666666667,0.0666666666666667];
   [0.0666666666666667,0.8,0.0666666666666667,0.0666666666666667]];
";
    #[test]
    fn parse_sticky_model() {
        let model = parse_model(STICKY, &ModelConfig::default()).unwrap();
        let sticky = sticky_model();
        assert_eq!(model.states(), 2);
        assert_eq!(model.symbols(), 4);
        assert!(model.dist(&sticky).unwrap() < 1e-20);
    }
    #[test]
    fn text_round_trip() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(392);
        let mut model = Model::random(4, 5, &ModelConfig::default(), &mut rng);
        model.set_transition(1, 2, f64::NEG_INFINITY);
        let mut buf = vec![];
        write_model(&mut buf, &model).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let loaded = parse_model(&text, &ModelConfig::default()).unwrap();
        let (x, y) = (model.parameters(), loaded.parameters());
        assert_eq!(y.transition(1, 2), f64::NEG_INFINITY);
        for i in 0..4 {
            assert!((x.initial(i).exp() - y.initial(i).exp()).abs() < 1e-5);
            assert!((x.terminal(i).exp() - y.terminal(i).exp()).abs() < 1e-5);
            for j in 0..4 {
                assert!((x.transition(i, j).exp() - y.transition(i, j).exp()).abs() < 1e-5);
            }
            for k in 0..5 {
                assert!((x.emission(i, k).exp() - y.emission(i, k).exp()).abs() < 1e-5);
            }
        }
    }
    #[test]
    fn log_round_trip() {
        let mut model = sticky_model();
        model.set_emission(0, 3, f64::NEG_INFINITY);
        let mut buf = vec![];
        write_log_model(&mut buf, &model).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("-1.00000e3"));
        assert!(!text.contains("inf"));
        let loaded = parse_log_model(&text, &ModelConfig::default()).unwrap();
        assert_eq!(loaded.emission(0, 3), f64::NEG_INFINITY);
        assert!((loaded.transition(0, 1) - 0.1f64.ln()).abs() < 1e-5);
        // Log values are not probabilities.
        assert!(parse_model(&text, &ModelConfig::default()).is_err());
    }
    #[test]
    fn malformed_models() {
        let config = ModelConfig::default();
        let line_of = |input: &str| match parse_model(input, &config) {
            Err(Error::Parse { line, .. }) => Some(line),
            _ => None,
        };
        // Arrays before N.
        assert_eq!(line_of("p=[1];\nN=1;"), Some(1));
        // Wrong length.
        assert_eq!(line_of("N=2;\nM=1;\n\np=[1];"), Some(4));
        // Missing bracket.
        assert!(line_of("N=1;M=1;p=[1;").is_some());
        // Double definition.
        assert_eq!(line_of("N=1;\nN=2;"), Some(2));
        assert_eq!(line_of("N=1;M=1;\nX=3;"), Some(2));
        assert_eq!(line_of("N=1;M=1;ORDER=2;"), Some(1));
        assert!(line_of("N=1;M=1;\np=[1];q=[1];a=[[1]];").is_some());
        assert!(matches!(
            parse_model("N=1;M=1;p=[-1];q=[1];a=[[1]];b=[[1]];", &config),
            Err(Error::Invalid(_))
        ));
        assert!(parse_model("N=1;M=1;p=[1];q=[1];a=[[1]];b=[[1]];", &config).is_ok());
    }
    #[test]
    fn parse_definitions_file() {
        let input = "% definitions
learn_a=[[1,0];[0,1];[-1,-1]];
learn_b=[[0,2]];
learn_p=[1,0,-1];
const_a=[[0,0,0.5];[1,1,0.25];[-1,-1,-1]];
const_q=[[1,1.0],[-1,-1]];
";
        let mask = parse_definitions(input).unwrap();
        assert_eq!(mask.learn_a(), &[(0, 1), (1, 0)]);
        assert_eq!(mask.learn_b(), &[(0, 2)]);
        assert_eq!(mask.learn_p(), &[0, 1]);
        assert!(mask.learn_q().is_empty());
        assert_eq!(mask.const_a(), &[(0, 0, 0.5), (1, 1, 0.25)]);
        assert_eq!(mask.const_q(), &[(1, 1.0)]);
        assert!(parse_definitions("learn_x=[1];").is_err());
        assert!(parse_definitions("learn_a=[[1,0,3]];").is_err());
        assert!(parse_definitions("learn_p=[0.5];").is_err());
        assert!(parse_definitions("learn_p=[0];learn_p=[1];").is_err());
    }
    #[test]
    fn definitions_round_trip() {
        let mask = TrainingMask::new()
            .learn_transition(0, 1)
            .learn_transition(2, 0)
            .learn_emission(1, 3)
            .learn_initial(2)
            .const_transition(1, 1, 0.125)
            .const_emission(0, 0, 1.0)
            .const_initial(0, 0.3)
            .const_terminal(1, 1e-3);
        let mut buf = vec![];
        write_definitions(&mut buf, &mask).unwrap();
        let loaded = parse_definitions(&String::from_utf8(buf).unwrap()).unwrap();
        assert_eq!(loaded, mask);
        let mut buf = vec![];
        write_definitions(&mut buf, &TrainingMask::new()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("learn_p=[-1];"), "{}", text);
        assert!(text.contains("learn_a=[[-1,-1]];"), "{}", text);
        let loaded = parse_definitions(&text).unwrap();
        assert_eq!(loaded, TrainingMask::new());
    }
}
