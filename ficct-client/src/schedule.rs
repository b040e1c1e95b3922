//! Weekly timetable layout
//!
//! Places schedule entries on a day by time-block grid for display. Entries
//! that share a cell are kept side by side; resolving them is the backend's
//! job.

use crate::models::Horario;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Teaching day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Lunes,
    Martes,
    Miercoles,
    Jueves,
    Viernes,
    Sabado,
}

impl Day {
    pub const ALL: [Day; 6] = [
        Day::Lunes,
        Day::Martes,
        Day::Miercoles,
        Day::Jueves,
        Day::Viernes,
        Day::Sabado,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Day::Lunes => "Lunes",
            Day::Martes => "Martes",
            Day::Miercoles => "Miércoles",
            Day::Jueves => "Jueves",
            Day::Viernes => "Viernes",
            Day::Sabado => "Sábado",
        }
    }

    /// Accepts any case, with or without accents, and ISO weekday numbers 1-6
    pub fn parse(value: &str) -> Option<Day> {
        let folded: String = value
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' => 'u',
                other => other,
            })
            .collect();

        match folded.as_str() {
            "lunes" | "1" => Some(Day::Lunes),
            "martes" | "2" => Some(Day::Martes),
            "miercoles" | "3" => Some(Day::Miercoles),
            "jueves" | "4" => Some(Day::Jueves),
            "viernes" | "5" => Some(Day::Viernes),
            "sabado" | "6" => Some(Day::Sabado),
            _ => None,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::parse(s).ok_or_else(|| format!("unknown day '{}'", s))
    }
}

/// Start and end of a class, as `HH:MM`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBlock {
    pub start: String,
    pub end: String,
}

impl TimeBlock {
    /// Normalizes `7:00`, `07:00` and `07:00:00` to `07:00`
    pub fn new(start: &str, end: &str) -> Option<Self> {
        let start = normalize_time(start)?;
        let end = normalize_time(end)?;
        (start < end).then_some(Self { start, end })
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn normalize_time(value: &str) -> Option<String> {
    let mut parts = value.trim().split(':');
    let hours: u8 = parts.next()?.parse().ok()?;
    let minutes: u8 = parts.next()?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hours, minutes))
}

/// Schedule entries laid out by day and block
#[derive(Debug, Clone, Default)]
pub struct ScheduleGrid {
    cells: BTreeMap<(Day, TimeBlock), Vec<Horario>>,
    unplaced: Vec<Horario>,
}

impl ScheduleGrid {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Horario>,
    {
        let mut grid = Self::default();
        for entry in entries {
            let slot = Day::parse(&entry.dia)
                .zip(TimeBlock::new(&entry.hora_inicio, &entry.hora_fin));
            match slot {
                Some(key) => grid.cells.entry(key).or_default().push(entry),
                None => {
                    tracing::debug!(dia = %entry.dia, "Schedule entry has no valid slot");
                    grid.unplaced.push(entry);
                }
            }
        }
        grid
    }

    pub fn cell(&self, day: Day, block: &TimeBlock) -> &[Horario] {
        self.cells
            .get(&(day, block.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct blocks in chronological order; these are the grid rows
    pub fn blocks(&self) -> Vec<TimeBlock> {
        self.cells
            .keys()
            .map(|(_, block)| block.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Days that have at least one class
    pub fn days(&self) -> Vec<Day> {
        self.cells
            .keys()
            .map(|(day, _)| *day)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Cells holding more than one entry
    pub fn conflicts(&self) -> Vec<(Day, &TimeBlock, &[Horario])> {
        self.cells
            .iter()
            .filter(|(_, entries)| entries.len() > 1)
            .map(|((day, block), entries)| (*day, block, entries.as_slice()))
            .collect()
    }

    /// Entries whose day or times could not be read
    pub fn unplaced(&self) -> &[Horario] {
        &self.unplaced
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum::<usize>() + self.unplaced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
