use derive_more::{Deref, From, Into};
use ndarray::Array2;
use typed_index_collections::TiVec;

use crate::problem::Problem;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct HospitalIndex(pub usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct BdcIndex(pub usize);

/// Index into the set of all nodes. Hospitals come first, followed by the BDCs.
#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct NodeIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Hospital(HospitalIndex),
    Bdc(BdcIndex),
}

/// sets for the network design model
#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of hospitals
    pub H: Vec<HospitalIndex>,
    /// Set of blood distribution centers
    pub D: Vec<BdcIndex>,
    /// Set of all nodes, H and D
    pub N: Vec<NodeIndex>,
    /// Set of BDCs that must be open
    pub O: Vec<BdcIndex>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &Problem) -> Sets {
        macro_rules! set {
            ($type:ident, $n:expr) => {
                (0..$n).map(|i| $type(i)).collect::<Vec<_>>()
            };
        }

        Sets {
            H: set!(HospitalIndex, problem.hospitals().len()),
            D: set!(BdcIndex, problem.bdcs().len()),
            N: set!(NodeIndex, problem.nodes()),
            O: problem.open_bdcs().iter().map(|&d| BdcIndex(d)).collect(),
        }
    }

    /// The node of hospital `i`
    pub fn hospital(&self, i: HospitalIndex) -> NodeIndex {
        NodeIndex(*i)
    }

    /// The node of BDC `d`
    pub fn bdc(&self, d: BdcIndex) -> NodeIndex {
        NodeIndex(self.H.len() + *d)
    }

    pub fn kind(&self, n: NodeIndex) -> NodeKind {
        if *n < self.H.len() {
            NodeKind::Hospital(HospitalIndex(*n))
        } else {
            NodeKind::Bdc(BdcIndex(*n - self.H.len()))
        }
    }

    /// All hospitals except `i`
    pub fn other_hospitals(&self, i: HospitalIndex) -> impl Iterator<Item = HospitalIndex> + '_ {
        self.H.iter().copied().filter(move |j| *j != i)
    }
}

/// parameters for the network design model
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    /// fixed opening cost of BDC d
    pub g: TiVec<BdcIndex, f64>,
    /// blood supply capacity of BDC d
    pub p: TiVec<BdcIndex, f64>,
    /// blood demand of hospital i
    pub h: TiVec<HospitalIndex, f64>,
    /// earliest acceptable arrival time at hospital i
    pub e: TiVec<HospitalIndex, f64>,
    /// latest acceptable arrival time at hospital i
    pub b: TiVec<HospitalIndex, f64>,
    /// travel time between node i and node j
    pub tn_n: Array2<f64>,
    /// unit transport cost factor
    pub u: f64,
    /// shipment capacity divisor used in the transport cost
    pub Q: f64,
    /// scale constant of the subtour elimination constraints
    pub s: f64,
    /// aggregate demand, not used by any constraint
    pub D: Option<f64>,
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(problem: &Problem) -> Parameters {
        let n = problem.nodes();

        Parameters {
            g: problem.bdcs().iter().map(|d| d.opening_cost).collect(),
            p: problem.bdcs().iter().map(|d| d.capacity).collect(),
            h: problem.hospitals().iter().map(|h| h.demand).collect(),
            e: problem.hospitals().iter().map(|h| h.earliest).collect(),
            b: problem.hospitals().iter().map(|h| h.latest).collect(),
            tn_n: Array2::from_shape_fn((n, n), |(i, j)| problem.travel_time(i, j)),
            u: problem.unit_cost(),
            Q: problem.capacity_divisor(),
            s: problem.scale(),
            D: problem.aggregate_demand(),
        }
    }

    /// Travel time from node `i` to node `j`
    pub fn tn(&self, i: NodeIndex, j: NodeIndex) -> f64 {
        self.tn_n[[*i, *j]]
    }
}
