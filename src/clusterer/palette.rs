/// Colors handed to clusters by id; ids past the end wrap around
pub const CLUSTER_PALETTE: [&str; 8] = [
    "#ef4444", // red
    "#3b82f6", // blue
    "#22c55e", // green
    "#f59e0b", // amber
    "#a855f7", // purple
    "#ec4899", // pink
    "#14b8a6", // teal
    "#f97316", // orange
];

pub fn cluster_color(id: u32) -> &'static str {
    CLUSTER_PALETTE[id as usize % CLUSTER_PALETTE.len()]
}
