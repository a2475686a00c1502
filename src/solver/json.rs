#![allow(non_snake_case)]
use super::{ActiveSetSolver, DefaultSettings, SolverError};
use crate::algebra::*;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io, io::Read};

// A struct very similar to the problem data, but containing only the
// data types provided by the user (i.e. no internal state).

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
struct JsonProblemData<T: FloatT> {
    pub P: Matrix<T>,
    pub q: Vec<T>,
    pub A: Matrix<T>,
    pub b: Vec<T>,
    pub x0: Vec<T>,
    pub settings: DefaultSettings<T>,
}

/// Utilities for writing and reading problem snapshots to JSON files
pub trait SolverJSONReadWrite<T: FloatT>: Sized {
    /// Write the problem data, the current iterate (as the starting
    /// point) and the settings to a file in JSON format.
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error>;
    /// Create a solver from a problem snapshot previously written by
    /// [`write_to_file`](Self::write_to_file).
    fn read_from_file(file: &mut File) -> Result<Self, io::Error>;
}

impl<T> SolverJSONReadWrite<T> for ActiveSetSolver<T>
where
    T: FloatT + DeserializeOwned + Serialize,
{
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        let mut json_data = JsonProblemData {
            P: self.data.P.clone(),
            q: self.data.q.clone(),
            A: self.data.A.clone(),
            b: self.data.b.clone(),
            x0: self.current_iterate().to_vec(),
            settings: self.settings.clone(),
        };

        // sanitize settings to remove values that can't be serialized,
        // i.e. infs
        sanitize_settings(&mut json_data.settings);

        let json = serde_json::to_string(&json_data)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }

    fn read_from_file(file: &mut File) -> Result<Self, io::Error> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let mut json_data: JsonProblemData<T> = serde_json::from_str(&buffer)?;

        // restore sanitized settings to their (likely) original values
        desanitize_settings(&mut json_data.settings);

        let solver = Self::new(
            &json_data.P,
            &json_data.q,
            &json_data.A,
            &json_data.b,
            &json_data.x0,
            json_data.settings,
        )
        .map_err(|e: SolverError| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

        Ok(solver)
    }
}

fn sanitize_settings<T: FloatT>(settings: &mut DefaultSettings<T>) {
    if settings.r_max == T::infinity() {
        settings.r_max = T::max_value();
    }
}

fn desanitize_settings<T: FloatT>(settings: &mut DefaultSettings<T>) {
    if settings.r_max == T::max_value() {
        settings.r_max = T::infinity();
    }
}
