use chrono::{Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const ROWS: usize = 600;

fn main() {
    let mut rng = SimpleRng::new(42);

    let regions = ["North", "South", "East", "West"];
    let products = ["Widget", "Gadget", "Gizmo", "Doohickey"];
    let channels = ["Online", "Retail", "Partner", "Direct"];
    let segments = ["SMB", "Mid-Market", "Enterprise"];
    let prices = [("Widget", 120.0), ("Gadget", 260.0), ("Gizmo", 75.0), ("Doohickey", 410.0)];

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid start date");

    let output_path = "DATA.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record([
            "Date",
            "Region",
            "Product",
            "Channel",
            "Customer_Segment",
            "Leads",
            "Conversions",
            "Marketing_Spend",
            "Sales",
        ])
        .expect("Failed to write header");

    for row in 0..ROWS {
        let date = start + Duration::days((rng.next_u64() % 182) as i64);
        let product = rng.pick(&products);
        let price = prices
            .iter()
            .find(|(name, _)| *name == product)
            .map(|(_, p)| *p)
            .unwrap_or(100.0);

        // A few days with no leads but some walk-in conversions.
        let leads = if row % 97 == 0 {
            0.0
        } else {
            rng.gauss(60.0, 20.0).max(1.0).round()
        };
        let conversions = if leads == 0.0 {
            (rng.next_u64() % 4) as f64
        } else {
            (leads * (0.05 + 0.25 * rng.next_f64())).round()
        };
        let spend = (leads * rng.gauss(12.0, 3.0).max(2.0)).round();
        let sales = (conversions * price * (0.8 + 0.4 * rng.next_f64())).round();

        // Sprinkle in the kind of gaps real exports have.
        let date_cell = if row % 131 == 0 {
            "n/a".to_string()
        } else {
            date.format("%Y-%m-%d").to_string()
        };
        let region_cell = if row % 157 == 0 { "" } else { rng.pick(&regions) };

        writer
            .write_record([
                date_cell,
                region_cell.to_string(),
                product.to_string(),
                rng.pick(&channels).to_string(),
                rng.pick(&segments).to_string(),
                leads.to_string(),
                conversions.to_string(),
                spend.to_string(),
                sales.to_string(),
            ])
            .expect("Failed to write record");
    }

    writer.flush().expect("Failed to flush output");
    println!("Wrote {ROWS} records to {output_path}");
}
