//! Excerpt of the Rust bindings, used as enrichment input.

pub struct Env {
    ptr: usize,
}

pub struct Task {
    ptr: usize,
}

/// Objective sense types
pub struct Objsense;

impl Objsense {
    /// Minimize the objective function.
    pub const MINIMIZE: i32 = 0;
    /// Maximize the objective function.
    pub const MAXIMIZE: i32 = 1;
}

/// Bound keys
pub struct Boundkey;

impl Boundkey {
    /// The constraint or variable has a finite lower bound and an infinite upper bound.
    pub const LO: i32 = 0;
    /// The constraint or variable has an infinite lower bound and an finite upper bound.
    pub const UP: i32 = 1;
    /// The constraint or variable is fixed.
    pub const FX: i32 = 2;
    pub const FR: i32 = 3;
}

impl Task {
    /// Obtains the number of variables.
    ///
    /// # Returns
    ///
    /// - `numvar` Number of variables.
    ///
    /// Full documentation: https://docs.example.invalid/capi/getnumvar
    pub fn get_num_var(&self) -> Result<i32, String> {
        unimplemented!()
    }

    /// Optimizes the problem.
    ///
    /// See [`Task::optimize_rmt`]
    pub fn optimize(&mut self) -> Result<i32, String> {
        unimplemented!()
    }

    /// Changes the bounds of one variable.
    ///
    /// # Arguments
    ///
    /// - `j_` Index of the variable.
    /// - `bkx_` New bound key.
    pub fn put_var_bound(&mut self, j_: i32, bkx_: i32, blx_: f64, bux_: f64) -> Result<(), String> {
        unimplemented!()
    }
}

impl Drop for Task {
    fn drop(&mut self) {}
}
