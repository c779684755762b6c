use derive_more::Display;
use typed_index_collections::TiVec;

use super::model::Variables;
use super::sets_and_parameters::{BdcIndex, HospitalIndex, NodeIndex, NodeKind, Parameters, Sets};
use crate::models::mip::Solution;
use crate::models::utils::ConvertVars;

/// Binary values above this are read as selected
const SELECTED: f64 = 0.5;

/// Hospitals visited from one BDC, in depth-first order along the selected arcs
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub bdc: usize,
    pub stops: Vec<usize>,
}

/// A solution of the network design model, read back into network terms
#[derive(Debug, Clone)]
pub struct NetworkPlan {
    pub open: TiVec<BdcIndex, bool>,
    /// Selected arcs between distinct nodes
    pub arcs: Vec<(usize, usize)>,
    /// Units shipped between every pair of nodes
    pub shipments: Vec<Vec<f64>>,
    pub arrival: TiVec<HospitalIndex, f64>,
    pub earliness: TiVec<HospitalIndex, f64>,
    pub tardiness: TiVec<HospitalIndex, f64>,
    /// Route positions (MTZ potentials)
    pub position: TiVec<HospitalIndex, f64>,
    sets: Sets,
}

/// A property of a supply plan that does not hold
#[derive(Debug, Clone, PartialEq, Display)]
pub enum PlanViolation {
    #[display(fmt = "hospital {} is entered by {} arcs", _0, _1)]
    Entries(usize, usize),
    #[display(fmt = "BDC {} ships {} but serves a demand of {}", bdc, shipped, served)]
    FlowBalance { bdc: usize, shipped: f64, served: f64 },
    #[display(fmt = "BDC {} ships {} with a capacity of {}", bdc, shipped, capacity)]
    Capacity { bdc: usize, shipped: f64, capacity: f64 },
    #[display(fmt = "hospitals {:?} form a cycle", _0)]
    Cycle(Vec<usize>),
    #[display(fmt = "arc {} -> {} does not increase the route position", _0, _1)]
    Position(usize, usize),
    #[display(fmt = "BDC {} must be open", _0)]
    ClosedMandatory(usize),
}

impl NetworkPlan {
    pub fn new(sets: &Sets, vars: &Variables, solution: &Solution) -> NetworkPlan {
        let x = vars.x.convert(solution);
        let arcs = sets
            .N
            .iter()
            .flat_map(|&i| sets.N.iter().map(move |&j| (*i, *j)))
            .filter(|&(i, j)| i != j && x[i][j] > SELECTED)
            .collect();

        NetworkPlan {
            open: vars
                .y
                .convert(solution)
                .iter()
                .map(|&y| y > SELECTED)
                .collect(),
            arcs,
            shipments: vars.z.convert(solution),
            arrival: vars.v.convert(solution),
            earliness: vars.EE.convert(solution),
            tardiness: vars.GG.convert(solution),
            position: vars.U.convert(solution),
            sets: sets.clone(),
        }
    }

    /// Number of selected arcs entering hospital `i`
    pub fn entries(&self, i: HospitalIndex) -> usize {
        let node = *self.sets.hospital(i);
        self.arcs.iter().filter(|&&(_, to)| to == node).count()
    }

    /// Units BDC `d` ships to hospitals
    pub fn shipped(&self, d: BdcIndex) -> f64 {
        let from = *self.sets.bdc(d);
        self.sets
            .H
            .iter()
            .map(|&i| self.shipments[from][*self.sets.hospital(i)])
            .sum()
    }

    fn hospital_successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        let hospitals = self.sets.H.len();
        self.arcs
            .iter()
            .filter(move |&&(from, to)| from == node && to < hospitals)
            .map(|&(_, to)| to)
    }

    /// The hospitals reached from each open BDC
    pub fn routes(&self) -> Vec<Route> {
        let mut routes = Vec::new();
        for &d in &self.sets.D {
            let start = *self.sets.bdc(d);
            let mut stops = Vec::new();
            let mut stack: Vec<usize> = self.hospital_successors(start).collect();
            stack.reverse();
            while let Some(node) = stack.pop() {
                if stops.contains(&node) {
                    continue;
                }
                stops.push(node);
                let mut next: Vec<usize> = self.hospital_successors(node).collect();
                next.reverse();
                stack.extend(next);
            }
            if !stops.is_empty() {
                routes.push(Route { bdc: *d, stops });
            }
        }
        routes
    }

    /// A cycle formed by selected hospital to hospital arcs, if there is one
    pub fn hospital_cycle(&self) -> Option<Vec<usize>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(
            plan: &NetworkPlan,
            node: usize,
            marks: &mut Vec<Mark>,
            path: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            marks[node] = Mark::Active;
            path.push(node);
            for next in plan.hospital_successors(node) {
                match marks[next] {
                    Mark::Active => {
                        let start = path.iter().position(|&n| n == next).unwrap_or(0);
                        return Some(path[start..].to_vec());
                    }
                    Mark::New => {
                        if let Some(cycle) = visit(plan, next, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }
            path.pop();
            marks[node] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::New; self.sets.H.len()];
        for &i in &self.sets.H {
            if marks[*i] == Mark::New {
                let mut path = Vec::new();
                if let Some(cycle) = visit(self, *i, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Checks single entry, flow balance, capacity, absence of hospital cycles with strictly
    /// increasing positions, and that mandatory BDCs are open
    pub fn check(&self, parameters: &Parameters, tolerance: f64) -> Vec<PlanViolation> {
        let sets = &self.sets;
        let mut out = Vec::new();

        for &i in &sets.H {
            let entries = self.entries(i);
            if entries != 1 {
                out.push(PlanViolation::Entries(*i, entries));
            }
        }

        for &d in &sets.D {
            let from = *sets.bdc(d);
            let shipped = self.shipped(d);
            let served: f64 = sets
                .H
                .iter()
                .filter(|&&i| self.arcs.contains(&(from, *sets.hospital(i))))
                .map(|&i| parameters.h[i])
                .sum();
            if (shipped - served).abs() > tolerance {
                out.push(PlanViolation::FlowBalance {
                    bdc: *d,
                    shipped,
                    served,
                });
            }

            let capacity = if self.open[d] { parameters.p[d] } else { 0.0 };
            if shipped > capacity + tolerance {
                out.push(PlanViolation::Capacity {
                    bdc: *d,
                    shipped,
                    capacity,
                });
            }
        }

        if let Some(cycle) = self.hospital_cycle() {
            out.push(PlanViolation::Cycle(cycle));
        }

        for &(from, to) in &self.arcs {
            let (NodeKind::Hospital(i), NodeKind::Hospital(j)) =
                (sets.kind(NodeIndex::from(from)), sets.kind(NodeIndex::from(to)))
            else {
                continue;
            };
            if self.position[j] <= self.position[i] {
                out.push(PlanViolation::Position(from, to));
            }
        }

        for &o in &sets.O {
            if !self.open[o] {
                out.push(PlanViolation::ClosedMandatory(*o));
            }
        }

        out
    }
}
