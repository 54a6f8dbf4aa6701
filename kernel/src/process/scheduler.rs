/*
 * Copyright 2024 Luc Lenôtre
 *
 * This file is part of Maestro.
 *
 * Maestro is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * Maestro is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * Maestro. If not, see <https://www.gnu.org/licenses/>.
 */

//! The role of the process scheduler is to interrupt the currently running
//! process periodically to switch to another process that is in running state.
//!
//! Two scheduling classes coexist:
//! - Processes admitted as periodic real-time tasks (see [`Scheduler::admit_periodic`]) are
//!   scheduled by Earliest Deadline First: whichever admitted, runnable task has the closest
//!   absolute deadline always preempts the other class.
//! - Every other runnable process is scheduled by virtual runtime: the process with the
//!   smallest [`Process::vruntime`] is picked next, ties broken by arrival order then PID.

use crate::{
	arch,
	arch::x86::idt::IntFrame,
	int,
	int::CallbackHook,
	memory,
	memory::stack,
	process,
	process::{pid::Pid, regs::Regs, Process, SchedRt, State},
	time,
};
use core::{arch::asm, ffi::c_void};
use utils::{
	collections::{
		btreemap::BTreeMap,
		vec::Vec,
	},
	errno::{AllocResult, CollectResult},
	interrupt::cli,
	lock::IntMutex,
	math::rational::Rational,
	ptr::arc::Arc,
	vec,
};

/// The size of the temporary stack for context switching.
const TMP_STACK_SIZE: usize = 16 * memory::PAGE_SIZE;

/// The structure representing the process scheduler.
pub struct Scheduler {
	/// A vector containing the temporary stacks for each CPU cores.
	tmp_stacks: Vec<Vec<u8>>,

	/// The ticking callback hook, called at a regular interval to make the
	/// scheduler work.
	tick_callback_hook: CallbackHook,
	/// The total number of ticks since the instantiation of the scheduler.
	total_ticks: u64,

	/// A binary tree containing all processes registered to the current
	/// scheduler.
	processes: BTreeMap<Pid, Arc<IntMutex<Process>>>,
	/// The currently running process with its PID.
	curr_proc: Option<(Pid, Arc<IntMutex<Process>>)>,

	/// The current number of running processes.
	running_procs: usize,
}

impl Scheduler {
	/// Creates a new instance of scheduler.
	pub(super) fn new(cores_count: usize) -> AllocResult<Self> {
		// Allocate context switching stacks for each core
		let tmp_stacks = (0..cores_count)
			.map(|_| vec![0; TMP_STACK_SIZE])
			.collect::<AllocResult<CollectResult<_>>>()?
			.0?;
		// Register tick callback
		let mut clocks = time::hw::CLOCKS.lock();
		let pit = clocks.get_mut(b"pit".as_slice()).unwrap();
		let tick_callback_hook = int::register_callback(
			pit.get_interrupt_vector(),
			|_: u32, _: u32, frame: &mut IntFrame, ring: u8| {
				Scheduler::tick(process::get_scheduler(), frame, ring);
			},
		)?
		.unwrap();
		Ok(Self {
			tmp_stacks,

			tick_callback_hook,
			total_ticks: 0,

			processes: BTreeMap::new(),
			curr_proc: None,

			running_procs: 0,
		})
	}

	/// Returns a pointer to the top of the tmp stack for the given kernel `kernel`.
	pub fn get_tmp_stack(&mut self, core: u32) -> *mut c_void {
		unsafe {
			self.tmp_stacks[core as usize]
				.as_mut_ptr()
				.add(TMP_STACK_SIZE) as *mut _
		}
	}

	/// Returns the total number of ticks since the instanciation of the
	/// scheduler.
	pub fn get_total_ticks(&self) -> u64 {
		self.total_ticks
	}

	/// Returns the process with PID `pid`.
	///
	/// If the process doesn't exist, the function returns `None`.
	pub fn get_by_pid(&self, pid: Pid) -> Option<Arc<IntMutex<Process>>> {
		Some(self.processes.get(&pid)?.clone())
	}

	/// Returns the process with TID `tid`.
	///
	/// If the process doesn't exist, the function returns `None`.
	pub fn get_by_tid(&self, _tid: Pid) -> Option<Arc<IntMutex<Process>>> {
		// TODO
		todo!();
	}

	/// Returns the current running process.
	///
	/// If no process is running, the function returns `None`.
	pub fn get_current_process(&mut self) -> Option<Arc<IntMutex<Process>>> {
		Some(self.curr_proc.as_ref().cloned()?.1)
	}

	/// Adds a process to the scheduler.
	pub fn add_process(&mut self, process: Process) -> AllocResult<Arc<IntMutex<Process>>> {
		let pid = process.pid;
		if *process.get_state() == State::Running {
			self.increment_running();
		}
		let ptr = Arc::new(IntMutex::new(process))?;
		self.processes.insert(pid, ptr.clone())?;
		Ok(ptr)
	}

	/// Removes the process with the given pid `pid`.
	pub fn remove_process(&mut self, pid: Pid) {
		if let Some(proc_mutex) = self.get_by_pid(pid) {
			let proc = proc_mutex.lock();
			if *proc.get_state() == State::Running {
				self.decrement_running();
			}
			self.processes.remove(&pid);
		}
	}

	/// Returns the current ticking frequency of the scheduler.
	pub fn get_ticking_frequency(&self) -> Rational {
		Rational::from_integer((10 * self.running_procs) as _)
	}

	/// Increments the number of running processes.
	pub fn increment_running(&mut self) {
		self.running_procs += 1;

		let mut clocks = time::hw::CLOCKS.lock();
		let pit = clocks.get_mut(b"pit".as_slice()).unwrap();

		if self.running_procs > 1 {
			pit.set_frequency(self.get_ticking_frequency());
			pit.set_enabled(true);
		}
	}

	/// Decrements the number of running processes.
	pub fn decrement_running(&mut self) {
		self.running_procs -= 1;

		let mut clocks = time::hw::CLOCKS.lock();
		let pit = clocks.get_mut(b"pit".as_slice()).unwrap();

		if self.running_procs <= 1 {
			pit.set_enabled(false);
		} else {
			pit.set_frequency(self.get_ticking_frequency());
		}
	}

	/// Attempts to admit `pid` as a periodic real-time task with the given `period` and `wcet`
	/// (both in scheduler ticks).
	///
	/// This runs the classic EDF admission test: the task is admitted only if the sum of
	/// `WCET / period` across it and every already-admitted periodic task does not exceed `1`,
	/// the CPU's total capacity. On success, the process's first deadline is set to the current
	/// tick plus `period`.
	///
	/// Returns `false` if `pid` does not exist, `period` is zero, or the task would overrun the
	/// CPU's capacity; in either case, no state is changed.
	pub fn admit_periodic(&mut self, pid: Pid, period: u64, wcet: u64) -> bool {
		if period == 0 {
			return false;
		}
		let Some(proc) = self.get_by_pid(pid) else {
			return false;
		};
		let new_util = Rational::new(wcet as _, period as _);
		let total = self
			.processes
			.iter()
			.filter(|(p, _)| **p != pid)
			.filter_map(|(_, proc)| proc.lock().sched_rt.map(|rt| rt.utilization()))
			.fold(new_util, |acc, u| acc + u);
		if total > Rational::from_integer(1) {
			return false;
		}
		proc.lock().sched_rt = Some(SchedRt {
			period,
			wcet,
			deadline: self.total_ticks + period,
		});
		true
	}

	/// Returns the next process to run with its PID.
	///
	/// Periodic tasks admitted through [`Self::admit_periodic`] are considered first, picking
	/// the runnable one with the earliest absolute deadline. If none is runnable, the runnable
	/// process with the smallest virtual runtime is picked instead. Ties are broken by arrival
	/// order, then by PID.
	fn get_next_process(&self) -> Option<(Pid, Arc<IntMutex<Process>>)> {
		let edf_pick = self
			.processes
			.iter()
			.filter_map(|(pid, proc)| {
				let guard = proc.lock();
				if !guard.can_run() {
					return None;
				}
				let rt = guard.sched_rt?;
				Some((rt.deadline, guard.arrivaltime, *pid))
			})
			.min();
		if let Some((_, _, pid)) = edf_pick {
			return Some((pid, self.get_by_pid(pid).unwrap()));
		}
		let fair_pick = self
			.processes
			.iter()
			.filter_map(|(pid, proc)| {
				let guard = proc.lock();
				if !guard.can_run() || guard.sched_rt.is_some() {
					return None;
				}
				Some((guard.vruntime, guard.arrivaltime, *pid))
			})
			.min()?;
		Some((fair_pick.2, self.get_by_pid(fair_pick.2).unwrap()))
	}

	/// Ticking the scheduler.
	///
	/// This function saves the data of the currently running process, then switches to the next
	/// process to run.
	///
	/// If no process is ready to run, the scheduler halts the system until a process is runnable.
	///
	/// Arguments:
	/// - `sched_mutex` is the scheduler's mutex.
	/// - `frame` is the interrupt frame of the paused context.
	/// - `ring` is the ring of the paused context.
	fn tick(sched_mutex: &IntMutex<Self>, frame: &IntFrame, ring: u8) -> ! {
		// Disabling interrupts to avoid getting one right after unlocking mutexes
		cli();

		let tmp_stack = {
			let mut sched = sched_mutex.lock();
			sched.total_ticks += 1;
			let now = sched.total_ticks;

			// If a process is running, save its registers and credit it for the time it just
			// spent running
			if let Some(curr_proc) = sched.get_current_process() {
				let mut curr_proc = curr_proc.lock();

				curr_proc.regs = Regs::from(frame);
				curr_proc.syscalling = ring < 3;

				let elapsed = now.saturating_sub(curr_proc.exec_start).max(1);
				curr_proc.sum_exec_runtime += elapsed;
				curr_proc.vruntime += elapsed;
				if let Some(rt) = &mut curr_proc.sched_rt {
					if now >= rt.deadline {
						rt.deadline += rt.period;
					}
				}
			}

			// The current kernel ID
			let core_id = 0; // TODO
			sched.get_tmp_stack(core_id)
		};

		loop {
			let mut sched = sched_mutex.lock();

			if let Some(next_proc) = sched.get_next_process() {
				// Set the process as current
				sched.curr_proc = Some(next_proc.clone());
				next_proc.1.lock().exec_start = sched.total_ticks;

				drop(sched);

				unsafe {
					stack::switch(Some(tmp_stack), move || {
						let (resume, syscalling, regs) = {
							let mut next_proc = next_proc.1.lock();
							next_proc.prepare_switch();
							let resume = matches!(next_proc.get_state(), State::Running);
							(resume, next_proc.syscalling, next_proc.regs.clone())
						};
						drop(next_proc);
						// If the process has been killed by a signal, abort resuming
						if !resume {
							return;
						}
						// Resume execution
						arch::end_of_interrupt(0x0);
						regs.switch(!syscalling);
					})
					.unwrap();
				}
			} else {
				// No process to run. Just wait
				break;
			}
		}

		{
			sched_mutex.lock().curr_proc = None;
		}

		unsafe {
			arch::end_of_interrupt(0x0);
			crate::loop_reset(tmp_stack);
		}
	}
}

/// Called at the very start of interrupt handling, before any callback runs.
///
/// Scheduling decisions in this kernel are only ever made on the dedicated timer tick (see
/// [`Scheduler::tick`]), so there is nothing to poll here.
pub fn may_schedule() {}

/// Called once an interrupt has been fully handled, just before control returns to the
/// interrupted context.
///
/// Scheduling decisions in this kernel are only ever made on the dedicated timer tick (see
/// [`Scheduler::tick`]), so there is no deferred flow to apply here.
pub fn alter_flow(_ring: u8, _frame: &mut IntFrame) {}

/// Ends the current tick on the current CPU.
///
/// Since this function triggers an interruption, the caller must ensure that no critical mutex is
/// locked, that could be used in the interruption handler. Otherwise, a deadlock could occur.
#[inline]
pub fn end_tick() {
	unsafe {
		asm!("int 0x20");
	}
}
