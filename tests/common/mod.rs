//! Sample workbook shared by the integration tests.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};

pub const SALES_ROWS: u32 = 366;
pub const EMPLOYEE_ROWS: u32 = 100;
/// Date cells left blank in the Sales sheet (every row where `r % 61 == 30`).
pub const MISSING_DATES: usize = 6;
/// Units_Sold values planted far above the rest of the column.
pub const BULK_ORDERS: [f64; 5] = [113.0, 174.0, 140.0, 162.0, 105.0];

const FIRST_DAY_2024: f64 = 45292.0;
const PRODUCTS: [&str; 8] = [
    "Laptop", "Phone", "Tablet", "Monitor", "Keyboard", "Mouse", "Headset", "Webcam",
];
const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];
const DEPARTMENTS: [&str; 7] = [
    "Sales", "Marketing", "Engineering", "Finance", "Support", "Legal", "Operations",
];

/// Writes `sample_data.xlsx` into `dir`: a year of daily sales, an employee
/// roster and an empty `Archive` sheet.
pub fn write_sample_workbook(dir: &Path) -> Result<PathBuf, XlsxError> {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();

    let sales = workbook.add_worksheet();
    sales.set_name("Sales")?;
    let headers = [
        "Date",
        "Product",
        "Region",
        "Units_Sold",
        "Unit_Price",
        "Total_Sales",
        "Profit",
        "Customer_Rating",
        "Is_Weekend",
        "Notes",
    ];
    for (col, header) in headers.iter().enumerate() {
        sales.write_string(0, col as u16, *header)?;
    }

    let mut ordinary = 0u32;
    let mut bulk = BULK_ORDERS.iter();
    for r in 0..SALES_ROWS {
        let row = r + 1;
        if r % 61 != 30 {
            sales.write_number_with_format(row, 0, FIRST_DAY_2024 + r as f64, &date_format)?;
        }
        sales.write_string(row, 1, PRODUCTS[(r % 8) as usize])?;
        sales.write_string(row, 2, REGIONS[(r % 5) as usize])?;

        let units = match (r % 70 == 3).then(|| bulk.next()).flatten() {
            Some(v) => *v,
            None => {
                ordinary += 1;
                ((ordinary - 1) % 49 + 1) as f64
            }
        };
        let total = units * 100.0;
        sales.write_number(row, 3, units)?;
        sales.write_number(row, 4, 10.0 + (r * 37 % 990) as f64)?;
        sales.write_number(row, 5, total)?;
        sales.write_number(row, 6, total * 0.25)?;
        if r % 20 != 7 {
            sales.write_number(row, 7, (1 + r % 5) as f64)?;
        }
        sales.write_boolean(row, 8, r % 7 >= 5)?;
    }

    let employees = workbook.add_worksheet();
    employees.set_name("Employees")?;
    for (col, header) in ["Employee_ID", "Department", "Salary", "Hire_Date", "Promotion_Eligible"]
        .iter()
        .enumerate()
    {
        employees.write_string(0, col as u16, *header)?;
    }
    for r in 0..EMPLOYEE_ROWS {
        let row = r + 1;
        employees.write_number(row, 0, (1000 + r) as f64)?;
        employees.write_string(row, 1, DEPARTMENTS[(r % 7) as usize])?;
        employees.write_number(row, 2, 40_000.0 + (r * 613 % 50_000) as f64)?;
        employees.write_number_with_format(row, 3, 40_000.0 + (r * 53) as f64, &date_format)?;
        employees.write_boolean(row, 4, r % 3 == 0)?;
    }

    workbook.add_worksheet().set_name("Archive")?;

    let path = dir.join("sample_data.xlsx");
    workbook.save(&path)?;
    Ok(path)
}

/// A workbook whose sheets hold no cells at all.
pub fn write_empty_workbook(dir: &Path) -> Result<PathBuf, XlsxError> {
    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_name("Blank")?;
    workbook.add_worksheet().set_name("Archive")?;

    let path = dir.join("empty.xlsx");
    workbook.save(&path)?;
    Ok(path)
}
