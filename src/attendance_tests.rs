// src/attendance_tests.rs

#[cfg(test)]
mod tests {
    use crate::attendance::*;
    use crate::employee::ExclusionList;
    use crate::reference_data::TunjanganKinerja;
    use crate::sheet::Sheet;
    use crate::tunjangan::{apply_deductions, cut_percentage, result_sheet};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    // Helper to build a raw check-in row
    fn checkin(
        nama: &str,
        nip: &str,
        tanggal: &str,
        jenis: &str,
        terlambat: &str,
        pulang_cepat: &str,
    ) -> DailyCheckinRow {
        DailyCheckinRow {
            nama: nama.to_string(),
            nip: nip.to_string(),
            tanggal: tanggal.to_string(),
            jenis_checkin: jenis.to_string(),
            kategori_terlambat: terlambat.to_string(),
            kategori_pulang_cepat: pulang_cepat.to_string(),
        }
    }

    fn baseline(nip: &str, nama: &str, amount: Decimal) -> TunjanganKinerja {
        TunjanganKinerja {
            nip: nip.to_string(),
            nama: nama.to_string(),
            jabatan: String::new(),
            unit_kerja: String::new(),
            tunjangan_kinerja: amount,
        }
    }

    fn sheet(cells: &[&[&str]]) -> Sheet {
        Sheet::from_rows(
            cells
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    // --- Aggregation ---

    #[test]
    fn tl_exempts_every_other_row_in_the_day_bucket() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "A", "", ""),
            checkin("Budi", "100", "2025-03-03", "TL", "", ""),
            checkin("Budi", "100", "2025-03-03", "HADIR", "T2", "P1"),
        ];
        let records = aggregate_attendance(&rows);
        assert_eq!(records.len(), 1);
        let counts = &records[0].attendance_counts;
        assert_eq!(counts.tl, 1);
        assert_eq!(counts.a, 0);
        assert_eq!(counts.hadir, 0);
        assert_eq!(counts.t2, 0);
        assert_eq!(counts.p1, 0);
        assert_eq!(records[0].total_days, 1);
    }

    #[test]
    fn rows_in_one_day_classify_independently_and_additively() {
        // Check-in and check-out events disagree; both count.
        let rows = vec![
            checkin("Budi", "100", "2025-03-04", "HADIR", "T1", ""),
            checkin("Budi", "100", "2025-03-04", "HADIR", "", "P3"),
        ];
        let records = aggregate_attendance(&rows);
        let counts = &records[0].attendance_counts;
        assert_eq!(counts.hadir, 2);
        assert_eq!(counts.t1, 1);
        assert_eq!(counts.p3, 1);
        assert_eq!(records[0].total_days, 1);
    }

    #[test]
    fn empty_jenis_checkin_counts_as_absence() {
        let rows = vec![checkin("Budi", "100", "2025-03-05", "", "", "")];
        let records = aggregate_attendance(&rows);
        assert_eq!(records[0].attendance_counts.a, 1);
    }

    #[test]
    fn late_category_counts_independently_of_jenis_checkin() {
        let rows = vec![checkin("Budi", "100", "2025-03-06", "CUTI", "T4", "P4")];
        let records = aggregate_attendance(&rows);
        let counts = &records[0].attendance_counts;
        assert_eq!(counts.cuti, 1);
        assert_eq!(counts.t4, 1);
        assert_eq!(counts.p4, 1);
    }

    #[test]
    fn total_days_advances_once_per_distinct_date() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "HADIR", "", ""),
            checkin("Budi", "100", "2025-03-03", "HADIR", "", ""),
            checkin("Budi", "100", "2025-03-04", "TL", "", ""),
            checkin("Budi", "100", "2025-03-05", "CUTI", "", ""),
        ];
        let records = aggregate_attendance(&rows);
        assert_eq!(records[0].total_days, 3);
    }

    #[test]
    fn employees_are_bucketed_by_nip_and_name() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "HADIR", "", ""),
            checkin("Ani", "200", "2025-03-03", "HADIR", "", ""),
            checkin("Budi", "100", "2025-03-04", "HADIR", "", ""),
        ];
        let records = aggregate_attendance(&rows);
        assert_eq!(records.len(), 2);
        // Sorted by name ascending.
        assert_eq!(records[0].nama, "Ani");
        assert_eq!(records[1].nama, "Budi");
        assert_eq!(records[1].total_days, 2);
    }

    #[test]
    fn keterangan_lists_counts_in_fixed_order() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "", "", ""),
            checkin("Budi", "100", "2025-03-04", "HADIR", "T1", ""),
        ];
        let records = aggregate_attendance(&rows);
        assert_eq!(
            records[0].keterangan,
            "A:1, T1:1, T2:0, T3:0, T4:0, P1:0, P2:0, P3:0, P4:0, CUTI:0, TL:0, HADIR:1"
        );
    }

    #[test]
    fn checkin_rows_without_key_fields_are_dropped() {
        let s = sheet(&[
            &[
                "NAMA",
                "NIP_BARU",
                "TANGGAL_WITA",
                "JENIS_CHECKIN",
                "KATEGORI_TERLAMBAT",
                "KATEGORI_PULANG_CEPAT",
            ],
            &["Budi", "'100", "2025-03-03", "HADIR", "", ""],
            &["", "101", "2025-03-03", "HADIR", "", ""],
            &["Citra", "", "2025-03-03", "HADIR", "", ""],
            &["Dewi", "103", "", "HADIR", "", ""],
        ]);
        let rows = checkin_rows_from_sheet(&s);
        assert_eq!(rows.len(), 1);
        // Leading quote artifact stripped from the NIP.
        assert_eq!(rows[0].nip, "100");
    }

    #[test]
    fn day_classifications_sum_matches_total_days_for_single_row_days() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "HADIR", "", ""),
            checkin("Budi", "100", "2025-03-04", "A", "", ""),
            checkin("Budi", "100", "2025-03-05", "TL", "", ""),
            checkin("Budi", "100", "2025-03-06", "CUTI", "", ""),
        ];
        let records = aggregate_attendance(&rows);
        let c = &records[0].attendance_counts;
        let classified = c.a + c.cuti + c.tl + c.hadir;
        assert_eq!(classified, records[0].total_days);
    }

    // --- Deductions ---

    #[test]
    fn cut_is_additive_and_uncapped() {
        let rows: Vec<DailyCheckinRow> = (1..=21)
            .map(|day| checkin("Budi", "100", &format!("2025-03-{:02}", day), "A", "", ""))
            .collect();
        let records = aggregate_attendance(&rows);
        assert_eq!(records[0].attendance_counts.a, 21);
        assert_eq!(cut_percentage(&records[0]), dec!(105));

        let processed = apply_deductions(records, &[baseline("100", "Budi", dec!(1000000))]);
        assert_eq!(processed[0].cut_percentage, dec!(105));
        // Past 100% the allowance goes negative; that stands.
        assert!(processed[0].tunjangan_after < Decimal::ZERO);
        assert_eq!(processed[0].tunjangan_after, dec!(-50000));
        assert_eq!(processed[0].nominal_cut, dec!(1050000));
    }

    #[test]
    fn cut_weights_per_category() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "HADIR", "T1", ""),
            checkin("Budi", "100", "2025-03-04", "HADIR", "T2", ""),
            checkin("Budi", "100", "2025-03-05", "HADIR", "T3", ""),
            checkin("Budi", "100", "2025-03-06", "HADIR", "T4", ""),
            checkin("Budi", "100", "2025-03-07", "HADIR", "", "P1"),
            checkin("Budi", "100", "2025-03-10", "HADIR", "", "P2"),
            checkin("Budi", "100", "2025-03-11", "HADIR", "", "P3"),
            checkin("Budi", "100", "2025-03-12", "HADIR", "", "P4"),
        ];
        let records = aggregate_attendance(&rows);
        // 0.5 + 1 + 1.5 + 2.5 twice over
        assert_eq!(cut_percentage(&records[0]), dec!(11));
    }

    #[test]
    fn baseline_lookup_prefers_nip_then_falls_back_to_name() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "HADIR", "", ""),
            checkin("Ani", "200", "2025-03-03", "HADIR", "", ""),
        ];
        let records = aggregate_attendance(&rows);
        let baselines = vec![
            baseline("999", "Ani", dec!(4000000)),
            baseline("100", "Somebody Else", dec!(5000000)),
        ];
        let processed = apply_deductions(records, &baselines);
        // Ani has no NIP match, name fallback applies.
        assert_eq!(processed[0].tunjangan_before, dec!(4000000));
        // Budi matches by NIP even though the name differs.
        assert_eq!(processed[1].tunjangan_before, dec!(5000000));
    }

    #[test]
    fn missing_baseline_defaults_to_zero() {
        let rows = vec![checkin("Budi", "100", "2025-03-03", "HADIR", "T1", "")];
        let processed = apply_deductions(aggregate_attendance(&rows), &[]);
        assert_eq!(processed[0].tunjangan_before, Decimal::ZERO);
        assert_eq!(processed[0].tunjangan_after, Decimal::ZERO);
        assert_eq!(processed[0].nominal_cut, Decimal::ZERO);
        // The cut percentage is still recorded.
        assert_eq!(processed[0].cut_percentage, dec!(0.5));
    }

    #[test]
    fn clean_attendance_has_zero_cut() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "HADIR", "", ""),
            checkin("Budi", "100", "2025-03-04", "TL", "", ""),
            checkin("Budi", "100", "2025-03-05", "CUTI", "", ""),
        ];
        let processed = apply_deductions(
            aggregate_attendance(&rows),
            &[baseline("100", "Budi", dec!(3000000))],
        );
        assert_eq!(processed[0].cut_percentage, Decimal::ZERO);
        assert_eq!(processed[0].tunjangan_after, dec!(3000000));
        assert_eq!(processed[0].nominal_cut, Decimal::ZERO);
    }

    // --- Result sheet ---

    #[test]
    fn result_sheet_excludes_reporting_prefixes() {
        let rows = vec![
            checkin("Budi", "100", "2025-03-03", "HADIR", "", ""),
            checkin("Tamu", "TATT001", "2025-03-03", "HADIR", "", ""),
            checkin("Mitra", "PPNPN07", "2025-03-03", "HADIR", "", ""),
        ];
        let processed = apply_deductions(aggregate_attendance(&rows), &[]);
        let sheet = result_sheet(&processed, &ExclusionList::reporting());
        // One employee row plus the spacer and four totals rows.
        assert_eq!(sheet.rows().len(), 6);
        assert_eq!(sheet.rows()[0][0], "Budi");
        assert_eq!(sheet.headers().len(), 20);
        let pegawai = &sheet.rows()[2];
        assert_eq!(pegawai[0], "TOTAL PEGAWAI");
        assert_eq!(pegawai[1], "1");
    }

    #[test]
    fn result_sheet_carries_counts_and_amounts_as_text() {
        let rows = vec![checkin("Budi", "100", "2025-03-03", "HADIR", "T2", "")];
        let processed = apply_deductions(
            aggregate_attendance(&rows),
            &[baseline("100", "Budi", dec!(2000000))],
        );
        let sheet = result_sheet(&processed, &ExclusionList::reporting());
        let row = &sheet.rows()[0];
        assert_eq!(row[3], "1"); // total days
        assert_eq!(row[6], "1"); // T2
        assert_eq!(row[16], "2000000");
        assert_eq!(row[17], "1"); // cut %
        assert_eq!(row[18], "20000");
        assert_eq!(row[19], "1980000");
    }

    // --- Raw-sheet search ---

    #[test]
    fn search_returns_header_plus_matches_case_insensitively() {
        let s = sheet(&[
            &["NAMA", "NIP_BARU", "TANGGAL_WITA"],
            &["Budi Santoso", "100", "2025-03-03"],
            &["Ani Lestari", "200", "2025-03-03"],
        ]);
        let found = search_rows(&s, "budi").expect("should match");
        assert_eq!(found.rows().len(), 1);
        assert_eq!(found.rows()[0][0], "Budi Santoso");

        assert!(search_rows(&s, "zzz").is_none());
        assert!(search_rows(&s, "").is_none());
    }
}
