#![allow(non_snake_case)]
use super::active_set::ActiveSetIterator;
use super::{DefaultProblemData, DefaultSettings};
use crate::algebra::*;
use crate::io::PrintTarget;
use std::io::Write;

/// Progress reporting state for the solver.  All output goes through a
/// configurable [`PrintTarget`](crate::io::PrintTarget) so callers can
/// capture or discard it.
#[derive(Debug)]
pub(crate) struct DefaultInfo<T> {
    pub stream: PrintTarget,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> DefaultInfo<T>
where
    T: FloatT,
{
    pub fn new() -> Self {
        Self {
            stream: PrintTarget::default(),
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn print_configuration(
        &mut self,
        settings: &DefaultSettings<T>,
        data: &DefaultProblemData<T>,
        core: &ActiveSetIterator<T>,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }
        let out = &mut self.stream;

        writeln!(out, "-------------------------------------------------------------")?;
        writeln!(out, "      asqp v{}  -  active set QP solver", crate::VERSION)?;
        writeln!(out, "-------------------------------------------------------------")?;
        writeln!(out, "\nproblem:")?;
        writeln!(out, "  variables       = {}", data.n)?;
        writeln!(out, "  constraints     = {}", data.m)?;
        writeln!(out, "  initial working = {}", core.working_set.len())?;
        if settings.r_max.is_finite() || settings.r_min > T::zero() {
            writeln!(
                out,
                "  radius bounds   = [{:.3e}, {:.3e}]",
                settings.r_min, settings.r_max
            )?;
        }
        writeln!(out, "\nsettings:")?;
        writeln!(out, "  max iter        = {}", settings.max_iter)?;
        writeln!(out, "  kkt tolerance   = {:.3e}", settings.tol_kkt)?;
        writeln!(
            out,
            "  indefinite tol  = {:.3e}\n",
            settings.indefinite_tolerance
        )?;
        Ok(())
    }

    pub fn print_status_header(&mut self, settings: &DefaultSettings<T>) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }
        let out = &mut self.stream;
        writeln!(
            out,
            "iter      objective     infeas       |x|        |Z'g|     curv  ws  art"
        )?;
        writeln!(
            out,
            "-------------------------------------------------------------------------"
        )?;
        Ok(())
    }

    pub fn print_status(
        &mut self,
        settings: &DefaultSettings<T>,
        data: &DefaultProblemData<T>,
        core: &ActiveSetIterator<T>,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        let obj = core.objective(data);
        let infeas = core.infeasibility(data).max(T::zero());
        let norm_x = core.x.norm();
        let pgrad = core.projected_gradient_norm(data);
        let curv = if core.ldl.trailing_sign() > T::zero() {
            '+'
        } else {
            '-'
        };

        let out = &mut self.stream;
        writeln!(
            out,
            "{:<6} {:>12.5e} {:>10.3e} {:>10.3e} {:>10.3e}    {}  {:>3}  {:>3}",
            core.iterations,
            obj,
            infeas,
            norm_x,
            pgrad,
            curv,
            core.working_set.len(),
            core.ldl.artificial_constraints(),
        )?;
        Ok(())
    }

    pub fn print_footer(
        &mut self,
        settings: &DefaultSettings<T>,
        core: &ActiveSetIterator<T>,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }
        let out = &mut self.stream;
        writeln!(
            out,
            "-------------------------------------------------------------------------"
        )?;
        writeln!(
            out,
            "terminated: {} ({} iterations)",
            core.status, core.iterations
        )?;
        Ok(())
    }
}
