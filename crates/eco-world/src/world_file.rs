//! Plain-text world files.
//!
//! ```text
//! <rabbit maturity> <fox maturity> <fox starvation> <generations> <rows> <cols> <count>
//! ROCK|RABBIT|FOX <x> <y>
//! ...
//! ```
//!
//! Tokens are whitespace separated; line breaks only matter for error
//! reporting.

use crate::world::{World, WorldSnapshot};
use eco_core::{CellState, Error, Parameters, Position, Result};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// A parsed world file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldFile {
    pub parameters: Parameters,
    pub world: World,
}

/// Whitespace tokens tagged with their 1-based line number
struct Tokens<'a> {
    inner: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        let inner = input
            .lines()
            .enumerate()
            .flat_map(|(index, line)| line.split_whitespace().map(move |token| (index + 1, token)));
        Self {
            inner: Box::new(inner),
            last_line: 1,
        }
    }

    fn next_token(&mut self, expected: &str) -> Result<(usize, &'a str)> {
        match self.inner.next() {
            Some((line, token)) => {
                self.last_line = line;
                Ok((line, token))
            }
            None => Err(Error::parse(
                self.last_line,
                format!("unexpected end of input, expected {}", expected),
            )),
        }
    }

    fn number<T: FromStr>(&mut self, expected: &str) -> Result<T> {
        let (line, token) = self.next_token(expected)?;
        token
            .parse()
            .map_err(|_| Error::parse(line, format!("expected {}, found '{}'", expected, token)))
    }
}

pub fn parse_world(input: &str) -> Result<WorldFile> {
    let mut tokens = Tokens::new(input);

    let parameters = Parameters {
        rabbit_maturity_age: tokens.number("rabbit maturity age")?,
        fox_maturity_age: tokens.number("fox maturity age")?,
        fox_starvation_threshold: tokens.number("fox starvation threshold")?,
        generation_count: tokens.number("generation count")?,
    };
    let rows: i32 = tokens.number("row count")?;
    let cols: i32 = tokens.number("column count")?;
    let count: usize = tokens.number("object count")?;

    let mut world = World::new(rows, cols)?;
    for _ in 0..count {
        let (line, keyword) = tokens.next_token("ROCK, RABBIT or FOX")?;
        let state = CellState::from_keyword(keyword).ok_or_else(|| {
            Error::parse(
                line,
                format!("unknown object '{}', expected ROCK, RABBIT or FOX", keyword),
            )
        })?;
        let x = tokens.number("x coordinate")?;
        let y = tokens.number("y coordinate")?;
        world.place(state, Position::new(x, y))?;
    }

    if let Ok((line, token)) = tokens.next_token("") {
        warn!(line, token, "Ignoring trailing input after {} objects", count);
    }

    debug!(
        rows,
        cols,
        rabbits = world.rabbits.len(),
        foxes = world.foxes.len(),
        rocks = world.rock_count(),
        "World file parsed"
    );

    Ok(WorldFile { parameters, world })
}

pub fn read_world(path: &Path) -> Result<WorldFile> {
    let input = fs::read_to_string(path)?;
    parse_world(&input)
}

/// Write `snapshot` as a finished world.
///
/// The generation field is written as 0, so reading the file back and running
/// it again is a no-op unless the generation count is overridden.
pub fn write_world<W: Write>(
    writer: &mut W,
    params: &Parameters,
    snapshot: &WorldSnapshot<'_>,
) -> Result<()> {
    write_objects(writer, params, 0, snapshot)
}

/// Write `snapshot` as the starting point of a run of
/// `params.generation_count` generations
pub fn write_initial_world<W: Write>(
    writer: &mut W,
    params: &Parameters,
    snapshot: &WorldSnapshot<'_>,
) -> Result<()> {
    write_objects(writer, params, params.generation_count, snapshot)
}

fn write_objects<W: Write>(
    writer: &mut W,
    params: &Parameters,
    generations: u64,
    snapshot: &WorldSnapshot<'_>,
) -> Result<()> {
    let grid = snapshot.grid;
    let count = snapshot.rabbits.len() + snapshot.foxes.len() + snapshot.rock_count;

    writeln!(
        writer,
        "{} {} {} {} {} {} {}",
        params.rabbit_maturity_age,
        params.fox_maturity_age,
        params.fox_starvation_threshold,
        generations,
        grid.rows,
        grid.cols,
        count
    )?;

    for (pos, state) in snapshot.occupants() {
        if let Some(keyword) = state.keyword() {
            writeln!(writer, "{} {} {}", keyword, pos.x, pos.y)?;
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn save_world(path: &Path, params: &Parameters, snapshot: &WorldSnapshot<'_>) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    write_world(&mut writer, params, snapshot)
}

pub fn save_initial_world(
    path: &Path,
    params: &Parameters,
    snapshot: &WorldSnapshot<'_>,
) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    write_initial_world(&mut writer, params, snapshot)
}
